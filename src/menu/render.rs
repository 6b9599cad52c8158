//! Renders resolved menu entries into the document.

use crate::dom::{Document, NodeId};

use super::catalog::{ResolvedItem, ResolvedNode};

/// Builds sections of `ul.list` separated by `div.separator` inside
/// `container`, replacing its previous content. Returns the flyout nodes
/// created, in document order.
pub fn render_menu(doc: &mut Document, container: NodeId, items: &[ResolvedNode]) -> Vec<NodeId> {
    doc.clear_children(container);
    let mut flyouts = Vec::new();
    let mut section = doc.create_element_with_class("ul", "list");

    for node in items {
        match node {
            ResolvedNode::Separator => {
                flush_section(doc, container, &mut section);
                let sep = doc.create_element_with_class("div", "separator");
                doc.append_child(container, sep);
            }
            ResolvedNode::Item(item) => {
                let li = render_item(doc, item, "element", &mut flyouts);
                doc.append_child(section, li);
            }
        }
    }
    flush_section(doc, container, &mut section);
    flyouts
}

fn flush_section(doc: &mut Document, container: NodeId, section: &mut NodeId) {
    if !doc.children(*section).is_empty() {
        doc.append_child(container, *section);
        *section = doc.create_element_with_class("ul", "list");
    }
}

fn render_item(
    doc: &mut Document,
    item: &ResolvedItem,
    base_class: &str,
    flyouts: &mut Vec<NodeId>,
) -> NodeId {
    let mut class = base_class.to_string();
    if let Some(variant) = item.variant.and_then(|v| v.class()) {
        class.push(' ');
        class.push_str(variant);
    }
    let li = doc.create_element_with_class("li", &class);
    doc.set_attr(li, "role", "menuitem");
    if let Some(color) = item.color.as_deref().filter(|c| !c.is_empty()) {
        doc.set_attr(li, "style", &format!("color: {color}"));
    }

    let icon = item.icon.trim();
    if !icon.is_empty() {
        let markup = doc.create_markup(icon);
        doc.append_child(li, markup);
    }

    let label = doc.create_element_with_class("p", "label");
    doc.set_text(label, &item.label);
    doc.append_child(li, label);

    if let Some(href) = &item.href {
        doc.set_attr(li, "data-url", href);
        if let Some(target) = item.target.as_deref().filter(|t| *t != "_self") {
            doc.set_attr(li, "data-target", target);
        }
    }

    if !item.submenu.is_empty() {
        let sub = doc.create_element_with_class("ul", "sublist");
        doc.set_attr(sub, "role", "menu");
        doc.append_child(li, sub);
        enhance_flyout(doc, li);
        flyouts.push(li);
        for node in &item.submenu {
            let child = match node {
                ResolvedNode::Separator => {
                    let sep = doc.create_element_with_class("li", "separator");
                    doc.set_attr(sep, "role", "separator");
                    sep
                }
                ResolvedNode::Item(sub_item) => render_item(doc, sub_item, "subelement", flyouts),
            };
            doc.append_child(sub, child);
        }
    }
    li
}

fn enhance_flyout(doc: &mut Document, li: NodeId) {
    doc.add_class(li, "has-submenu");
    doc.set_attr(li, "aria-haspopup", "true");
    doc.set_attr(li, "aria-expanded", "false");
    doc.set_attr(li, "tabindex", "0");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::model::Variant;

    fn item(label: &str) -> ResolvedItem {
        ResolvedItem {
            label: label.to_string(),
            icon: "<svg></svg>".to_string(),
            href: None,
            target: None,
            variant: None,
            color: None,
            submenu: Vec::new(),
        }
    }

    #[test]
    fn test_sections_and_separators() {
        let mut doc = Document::new();
        let host = doc.create_element("div");
        doc.append_child(doc.body(), host);
        let items = vec![
            ResolvedNode::Separator,
            ResolvedNode::Item(ResolvedItem {
                variant: Some(Variant::Ok),
                ..item("A")
            }),
            ResolvedNode::Item(item("B")),
            ResolvedNode::Separator,
            ResolvedNode::Item(ResolvedItem {
                variant: Some(Variant::Warn),
                color: Some("red".into()),
                ..item("C")
            }),
        ];
        render_menu(&mut doc, host, &items);
        let html = doc.inner_html(host);
        assert_eq!(
            html,
            "<div class=\"separator\"></div>\
             <ul class=\"list\">\
             <li class=\"element special\" role=\"menuitem\"><svg></svg><p class=\"label\">A</p></li>\
             <li class=\"element\" role=\"menuitem\"><svg></svg><p class=\"label\">B</p></li>\
             </ul>\
             <div class=\"separator\"></div>\
             <ul class=\"list\">\
             <li class=\"element delete\" role=\"menuitem\" style=\"color: red\"><svg></svg><p class=\"label\">C</p></li>\
             </ul>"
        );
    }

    #[test]
    fn test_rerender_replaces_content() {
        let mut doc = Document::new();
        let host = doc.create_element("div");
        doc.append_child(doc.body(), host);
        render_menu(&mut doc, host, &[ResolvedNode::Item(item("Old"))]);
        render_menu(&mut doc, host, &[ResolvedNode::Item(item("New"))]);
        let text = doc.text_content(host);
        assert_eq!(text, "New");
    }

    #[test]
    fn test_flyout_markup() {
        let mut doc = Document::new();
        let host = doc.create_element("div");
        doc.append_child(doc.body(), host);
        let parent = ResolvedItem {
            submenu: vec![
                ResolvedNode::Item(ResolvedItem {
                    href: Some("/a".into()),
                    target: Some("_blank".into()),
                    ..item("Sub A")
                }),
                ResolvedNode::Separator,
                ResolvedNode::Item(ResolvedItem {
                    href: Some("/b".into()),
                    target: Some("_self".into()),
                    ..item("Sub B")
                }),
            ],
            ..item("Parent")
        };
        let flyouts = render_menu(&mut doc, host, &[ResolvedNode::Item(parent)]);
        assert_eq!(flyouts.len(), 1);
        let li = flyouts[0];
        assert!(doc.has_class(li, "has-submenu"));
        assert_eq!(doc.attr(li, "aria-expanded"), Some("false"));
        assert_eq!(doc.attr(li, "tabindex"), Some("0"));
        let subs = doc.elements_by_class("subelement");
        assert_eq!(subs.len(), 2);
        assert_eq!(doc.attr(subs[0], "data-url"), Some("/a"));
        assert_eq!(doc.attr(subs[0], "data-target"), Some("_blank"));
        assert_eq!(doc.attr(subs[1], "data-target"), None);
        let sep = doc.query(li, |d, n| d.attr(n, "role") == Some("separator"));
        assert!(sep.is_some());
    }
}
