//! Minimal arena-backed document model.
//!
//! The navigation components mutate the same things a browser page would:
//! attributes (`aria-expanded`, `hidden`, `tabindex`, `data-*`), classes, text
//! and child lists. [`Document`] stores those as an arena of nodes addressed
//! by [`NodeId`], answers the handful of queries the components need
//! (by id, by class, closest ancestor, containment) and serializes to HTML.
//!
//! Removed nodes are detached, not freed; ids stay valid for the lifetime of
//! the document.

use std::fmt::Write as _;

/// Handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    /// Pre-rendered trusted markup (icons), emitted verbatim.
    Markup(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Elements serialized without a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// An HTML-like document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document with `<html>`, `<head>` and `<body>`.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
        };
        doc.root = doc.create_element("html");
        doc.head = doc.create_element("head");
        doc.body = doc.create_element("body");
        doc.append_child(doc.root, doc.head);
        doc.append_child(doc.root, doc.body);
        doc
    }

    /// The `<html>` element.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// The `<head>` element.
    #[must_use]
    pub const fn head(&self) -> NodeId {
        self.head
    }

    /// The `<body>` element.
    #[must_use]
    pub const fn body(&self) -> NodeId {
        self.body
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    /// Creates a detached element with an initial class list.
    pub fn create_element_with_class(&mut self, tag: &str, class: &str) -> NodeId {
        let id = self.create_element(tag);
        self.set_attr(id, "class", class);
        id
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    /// Creates a detached node holding trusted markup.
    pub fn create_markup(&mut self, markup: &str) -> NodeId {
        self.push(NodeKind::Markup(markup.to_string()))
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    /// Appends `child` to `parent`, moving it if it is already attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Inserts `child` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(0, child);
    }

    /// Inserts `node` right after `reference` in its parent's child list.
    ///
    /// Does nothing when `reference` is detached.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        let Some(parent) = self.nodes[reference.0].parent else {
            return;
        };
        self.detach(node);
        let siblings = &mut self.nodes[parent.0].children;
        let index = siblings
            .iter()
            .position(|&c| c == reference)
            .map_or(siblings.len(), |i| i + 1);
        siblings.insert(index, node);
        self.nodes[node.0].parent = Some(parent);
    }

    /// Detaches `node` (and its subtree) from the document.
    pub fn remove(&mut self, node: NodeId) {
        self.detach(node);
    }

    /// Detaches every child of `node`.
    pub fn clear_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Parent of `node`, if attached.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Children of `node` in order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Element children of `node` in order.
    #[must_use]
    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|&c| self.tag(c).is_some())
            .collect()
    }

    /// Tag name for elements, `None` for text and markup nodes.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Reads an attribute.
    #[must_use]
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Returns true when the attribute is present (any value).
    #[must_use]
    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    /// Sets an attribute, keeping its original position when it already exists.
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[node.0].kind {
            if let Some(slot) = attrs.iter_mut().find(|(k, _)| k == name) {
                slot.1 = value.to_string();
            } else {
                attrs.push((name.to_string(), value.to_string()));
            }
        }
    }

    /// Removes an attribute.
    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[node.0].kind {
            attrs.retain(|(k, _)| k != name);
        }
    }

    /// Adds (`on`) or removes a boolean attribute such as `hidden`.
    pub fn toggle_attr(&mut self, node: NodeId, name: &str, on: bool) {
        if on {
            if !self.has_attr(node, name) {
                self.set_attr(node, name, "");
            }
        } else {
            self.remove_attr(node, name);
        }
    }

    /// Returns true when the class list contains `class`.
    #[must_use]
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attr(node, "class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    /// Adds a class if missing.
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let list = match self.attr(node, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attr(node, "class", &list);
    }

    /// Removes a class if present.
    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        let Some(existing) = self.attr(node, "class") else {
            return;
        };
        let list: Vec<&str> = existing.split_whitespace().filter(|c| *c != class).collect();
        let list = list.join(" ");
        self.set_attr(node, "class", &list);
    }

    /// Adds or removes a class.
    pub fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) {
        if on {
            self.add_class(node, class);
        } else {
            self.remove_class(node, class);
        }
    }

    /// Returns true when `ancestor` is `node` or one of its ancestors.
    #[must_use]
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Returns true when `node` is reachable from the document root.
    #[must_use]
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.contains(self.root, node)
    }

    /// Nearest inclusive ancestor matching `pred`.
    pub fn closest(&self, node: NodeId, pred: impl Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.tag(n).is_some() && pred(self, n) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    /// Nearest inclusive ancestor carrying `class`.
    #[must_use]
    pub fn closest_class(&self, node: NodeId, class: &str) -> Option<NodeId> {
        self.closest(node, |d, n| d.has_class(n, class))
    }

    /// All descendants of `node` in document order, excluding `node` itself.
    #[must_use]
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// Descendant elements of `scope` matching `pred`, in document order.
    pub fn query_all(&self, scope: NodeId, pred: impl Fn(&Self, NodeId) -> bool) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| self.tag(n).is_some() && pred(self, n))
            .collect()
    }

    /// First descendant element of `scope` matching `pred`.
    pub fn query(&self, scope: NodeId, pred: impl Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        self.query_all(scope, pred).into_iter().next()
    }

    /// Attached element with the given `id` attribute.
    #[must_use]
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.query(self.root, |d, n| d.attr(n, "id") == Some(id))
    }

    /// Attached elements carrying `class`, in document order.
    #[must_use]
    pub fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        self.query_all(self.root, |d, n| d.has_class(n, class))
    }

    /// Replaces the children of `node` with a single text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.clear_children(node);
        let text = self.create_text(text);
        self.append_child(node, text);
    }

    /// Replaces the children of `node` with trusted markup.
    pub fn set_markup(&mut self, node: NodeId, markup: &str) {
        self.clear_children(node);
        if !markup.is_empty() {
            let markup = self.create_markup(markup);
            self.append_child(node, markup);
        }
    }

    /// Concatenated text of `node` and its descendants (markup excluded).
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let NodeKind::Text(t) = &self.nodes[node.0].kind {
            out.push_str(t);
        }
        for n in self.descendants(node) {
            if let NodeKind::Text(t) = &self.nodes[n.0].kind {
                out.push_str(t);
            }
        }
        out
    }

    /// Serializes the children of `node`.
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_html(child, &mut out);
        }
        out
    }

    /// Serializes `node` and its subtree.
    #[must_use]
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].kind {
            NodeKind::Text(t) => out.push_str(&escape_text(t)),
            NodeKind::Markup(m) => out.push_str(m),
            NodeKind::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (k, v) in attrs {
                    if v.is_empty() && k != "class" && k != "value" {
                        let _ = write!(out, " {k}");
                    } else {
                        let _ = write!(out, " {k}=\"{}\"", escape_attr(v));
                    }
                }
                out.push('>');
                if VOID_TAGS.contains(&tag.as_str()) {
                    return;
                }
                for &child in &self.nodes[node.0].children {
                    self.write_html(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

/// Escapes text content for HTML output.
#[must_use]
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escapes an attribute value for double-quoted HTML output.
#[must_use]
pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
