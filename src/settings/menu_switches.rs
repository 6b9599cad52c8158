//! Menubar tab visibility driven by switches.

use crate::dom::{Document, NodeId};
use crate::hover::HoverMenus;

/// Finds the menubar trigger for a menu key (`.iconDiv[data-key=...]`).
#[must_use]
pub fn menu_trigger(doc: &Document, menu_key: &str) -> Option<NodeId> {
    doc.query(doc.root(), |d, n| {
        d.has_class(n, "iconDiv") && d.attr(n, "data-key") == Some(menu_key)
    })
}

/// Shows or hides a menubar trigger.
///
/// A disabled trigger is hidden from layout and assistive technology, leaves
/// the tab order and is collapsed with its timers cancelled.
pub fn set_menu_enabled(doc: &mut Document, hover: &mut HoverMenus, menu_key: &str, enabled: bool) {
    let Some(node) = menu_trigger(doc, menu_key) else {
        return;
    };
    doc.toggle_attr(node, "hidden", !enabled);
    doc.set_attr(node, "aria-hidden", if enabled { "false" } else { "true" });
    doc.set_attr(node, "aria-disabled", if enabled { "false" } else { "true" });
    doc.set_attr(node, "tabindex", if enabled { "0" } else { "-1" });
    if !enabled {
        if let Some(index) = hover.index_of(node) {
            hover.force_close(doc, index);
        } else {
            doc.set_attr(node, "aria-expanded", "false");
        }
    }
}

/// Writes `data-ambient` on the document root.
pub fn apply_ambient(doc: &mut Document, on: bool) {
    let root = doc.root();
    doc.set_attr(root, "data-ambient", if on { "on" } else { "off" });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hover::HoverDelays;

    #[test]
    fn test_disable_hides_and_collapses() {
        let mut doc = Document::new();
        let body = doc.body();
        let t = doc.create_element_with_class("div", "iconDiv");
        doc.set_attr(t, "data-key", "shipping");
        doc.set_attr(t, "data-hasmenu", "");
        let menu = doc.create_element("div");
        doc.set_attr(menu, "data-submenu", "");
        doc.append_child(t, menu);
        doc.append_child(body, t);
        let mut hover = HoverMenus::mount(&mut doc, HoverDelays::default());
        hover.set_expanded(&mut doc, 0, true);

        set_menu_enabled(&mut doc, &mut hover, "shipping", false);
        assert!(doc.has_attr(t, "hidden"));
        assert_eq!(doc.attr(t, "aria-hidden"), Some("true"));
        assert_eq!(doc.attr(t, "aria-disabled"), Some("true"));
        assert_eq!(doc.attr(t, "tabindex"), Some("-1"));
        assert_eq!(doc.attr(t, "aria-expanded"), Some("false"));

        set_menu_enabled(&mut doc, &mut hover, "shipping", true);
        assert!(!doc.has_attr(t, "hidden"));
        assert_eq!(doc.attr(t, "tabindex"), Some("0"));
        assert_eq!(doc.attr(t, "aria-expanded"), Some("false"));
    }

    #[test]
    fn test_unknown_menu_is_ignored() {
        let mut doc = Document::new();
        let mut hover = HoverMenus::new(HoverDelays::default());
        set_menu_enabled(&mut doc, &mut hover, "nope", false);
        apply_ambient(&mut doc, true);
        assert_eq!(doc.attr(doc.root(), "data-ambient"), Some("on"));
    }
}
