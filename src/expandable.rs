//! Registry of open disclosure controls.
//!
//! A control owns `aria-expanded` and may name the panel it opens through
//! `aria-controls`. A pointer-down outside every open control and its panel,
//! or an Escape anywhere, closes them all.

use crate::dom::{Document, NodeId};

/// Tracks which disclosure controls are currently expanded.
#[derive(Debug, Default, Clone)]
pub struct Expandables {
    active: Vec<NodeId>,
}

impl Expandables {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `aria-expanded` on `control` and updates the open set.
    pub fn set_expanded(&mut self, doc: &mut Document, control: NodeId, on: bool) {
        doc.set_attr(control, "aria-expanded", if on { "true" } else { "false" });
        self.active.retain(|&c| c != control);
        if on {
            self.active.push(control);
        }
    }

    /// Reads `aria-expanded` from the control.
    #[must_use]
    pub fn is_expanded(doc: &Document, control: NodeId) -> bool {
        doc.attr(control, "aria-expanded") == Some("true")
    }

    /// Flips a control.
    pub fn toggle(&mut self, doc: &mut Document, control: NodeId) {
        let open = Self::is_expanded(doc, control);
        self.set_expanded(doc, control, !open);
    }

    /// Collapses every open control except `except`.
    pub fn close_all(&mut self, doc: &mut Document, except: Option<NodeId>) {
        for control in self.active.clone() {
            if Some(control) != except {
                self.set_expanded(doc, control, false);
            }
        }
    }

    /// Open controls, oldest first.
    #[must_use]
    pub fn open_controls(&self) -> &[NodeId] {
        &self.active
    }

    /// Handles a pointer-down anywhere in the document.
    ///
    /// Presses inside an open control or the panel it controls are ignored.
    pub fn pointer_down(&mut self, doc: &mut Document, target: NodeId) {
        let inside = self.active.iter().any(|&control| {
            if doc.contains(control, target) {
                return true;
            }
            doc.attr(control, "aria-controls")
                .and_then(|id| doc.element_by_id(id))
                .is_some_and(|panel| doc.contains(panel, target))
        });
        if !inside {
            self.close_all(doc, None);
        }
    }

    /// Handles a document-level Escape.
    ///
    /// Closes everything and returns the most recently opened control so the
    /// host can move focus back to it.
    pub fn escape(&mut self, doc: &mut Document) -> Option<NodeId> {
        let last = self.active.last().copied();
        self.close_all(doc, None);
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let btn = doc.create_element("button");
        doc.set_attr(btn, "aria-controls", "menu-settings");
        let panel = doc.create_element("div");
        doc.set_attr(panel, "id", "menu-settings");
        let inner = doc.create_element("input");
        doc.append_child(panel, inner);
        doc.append_child(body, btn);
        doc.append_child(body, panel);
        (doc, btn, panel, inner)
    }

    #[test]
    fn test_pointer_down_inside_panel_keeps_open() {
        let (mut doc, btn, _panel, inner) = setup();
        let mut ex = Expandables::new();
        ex.set_expanded(&mut doc, btn, true);

        ex.pointer_down(&mut doc, inner);
        assert!(Expandables::is_expanded(&doc, btn));

        let body = doc.body();
        ex.pointer_down(&mut doc, body);
        assert!(!Expandables::is_expanded(&doc, btn));
        assert!(ex.open_controls().is_empty());
    }

    #[test]
    fn test_escape_returns_last_control() {
        let (mut doc, btn, _, _) = setup();
        let mut ex = Expandables::new();
        let other = doc.create_element("button");
        ex.set_expanded(&mut doc, other, true);
        ex.set_expanded(&mut doc, btn, true);

        assert_eq!(ex.escape(&mut doc), Some(btn));
        assert_eq!(doc.attr(other, "aria-expanded"), Some("false"));
        assert_eq!(ex.escape(&mut doc), None);
    }
}
