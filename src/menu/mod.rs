//! Data-driven menus: model, catalog and renderer.

pub mod catalog;
pub mod model;
pub mod render;

pub use catalog::{Catalog, CatalogIssue, HrefRegistry, IconRegistry, ResolvedItem, ResolvedNode};
pub use model::{MenuDef, MenuItem, MenuNode, Variant};
pub use render::render_menu;

use crate::dom::{Document, NodeId};

/// Where activating a link should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Replace the current page.
    SameTab,
    /// Open a new tab.
    NewTab,
    /// Open into a named browsing context.
    Named(String),
}

impl LinkTarget {
    /// Maps an HTML `target` value.
    #[must_use]
    pub fn parse(target: Option<&str>) -> Self {
        match target {
            None | Some("" | "_self") => Self::SameTab,
            Some("_blank") => Self::NewTab,
            Some(other) => Self::Named(other.to_string()),
        }
    }
}

/// A navigation request produced by a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Destination.
    pub href: String,
    /// Browsing context.
    pub target: LinkTarget,
}

impl Navigation {
    /// Same-tab navigation to `href`.
    #[must_use]
    pub fn same_tab(href: &str) -> Self {
        Self {
            href: href.to_string(),
            target: LinkTarget::SameTab,
        }
    }

    /// New-tab navigation to `href`.
    #[must_use]
    pub fn new_tab(href: &str) -> Self {
        Self {
            href: href.to_string(),
            target: LinkTarget::NewTab,
        }
    }
}

/// Navigation carried by the innermost rendered item around `target`.
#[must_use]
pub fn navigation_at(doc: &Document, target: NodeId) -> Option<Navigation> {
    let li = doc.closest(target, |d, n| d.has_attr(n, "data-url"))?;
    let href = doc.attr(li, "data-url")?;
    Some(Navigation {
        href: href.to_string(),
        target: LinkTarget::parse(doc.attr(li, "data-target")),
    })
}

/// Host element for menu `key`.
#[must_use]
pub fn menu_host(doc: &Document, key: &str) -> Option<NodeId> {
    doc.element_by_id(&format!("menu-{key}"))
}

/// Renders every catalog menu that has a `#menu-{key}` host. Returns the
/// flyouts created.
pub fn render_all(doc: &mut Document, catalog: &Catalog) -> Vec<NodeId> {
    let mut flyouts = Vec::new();
    for menu in &catalog.menus {
        if let Some(host) = menu_host(doc, &menu.key) {
            let items = catalog.resolve(&menu.items);
            flyouts.extend(render_menu(doc, host, &items));
        } else {
            tracing::debug!("No host for menu '{}'", menu.key);
        }
    }
    flyouts
}

/// Replaces the items of menu `key` and re-renders its host when present.
/// Returns the flyouts created, or `None` when the page has no host.
pub fn set_menu(
    doc: &mut Document,
    catalog: &mut Catalog,
    key: &str,
    items: Vec<MenuNode>,
) -> Option<Vec<NodeId>> {
    catalog.set_menu(key, items);
    let host = menu_host(doc, key)?;
    let resolved = catalog
        .menu(key)
        .map(|m| catalog.resolve(&m.items))
        .unwrap_or_default();
    Some(render_menu(doc, host, &resolved))
}

/// Collapses every open flyout and every expanded top-level trigger.
pub fn close_all_menus(doc: &mut Document) {
    let open = doc.query_all(doc.root(), |d, n| {
        d.has_class(n, "has-submenu") && d.has_class(n, "open")
    });
    for li in open {
        doc.remove_class(li, "open");
        doc.set_attr(li, "aria-expanded", "false");
    }
    let expanded = doc.query_all(doc.root(), |d, n| {
        d.has_class(n, "iconDiv")
            && d.has_attr(n, "data-hasmenu")
            && d.attr(n, "aria-expanded") == Some("true")
    });
    for btn in expanded {
        doc.set_attr(btn, "aria-expanded", "false");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_target_parse() {
        assert_eq!(LinkTarget::parse(None), LinkTarget::SameTab);
        assert_eq!(LinkTarget::parse(Some("_self")), LinkTarget::SameTab);
        assert_eq!(LinkTarget::parse(Some("_blank")), LinkTarget::NewTab);
        assert_eq!(
            LinkTarget::parse(Some("report")),
            LinkTarget::Named("report".into())
        );
    }

    #[test]
    fn test_set_menu_without_host_updates_catalog() {
        let mut doc = Document::new();
        let mut catalog = Catalog::builtin().unwrap();
        let out = set_menu(
            &mut doc,
            &mut catalog,
            "shipping",
            vec![MenuNode::Item(MenuItem::new("Only"))],
        );
        assert!(out.is_none());
        assert_eq!(catalog.menu("shipping").unwrap().items.len(), 1);
    }

    #[test]
    fn test_close_all_menus() {
        let mut doc = Document::new();
        let btn = doc.create_element_with_class("div", "iconDiv");
        doc.set_attr(btn, "data-hasmenu", "");
        doc.set_attr(btn, "aria-expanded", "true");
        let li = doc.create_element_with_class("li", "element has-submenu open");
        doc.set_attr(li, "aria-expanded", "true");
        doc.append_child(doc.body(), btn);
        doc.append_child(btn, li);
        close_all_menus(&mut doc);
        assert_eq!(doc.attr(btn, "aria-expanded"), Some("false"));
        assert!(!doc.has_class(li, "open"));
        assert_eq!(doc.attr(li, "aria-expanded"), Some("false"));
    }

    #[test]
    fn test_navigation_at_nested_label() {
        let mut doc = Document::new();
        let li = doc.create_element("li");
        doc.set_attr(li, "data-url", "/x");
        doc.set_attr(li, "data-target", "_blank");
        let p = doc.create_element("p");
        doc.append_child(doc.body(), li);
        doc.append_child(li, p);
        assert_eq!(navigation_at(&doc, p), Some(Navigation::new_tab("/x")));
    }
}
