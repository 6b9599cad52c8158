//! Icon and href registries plus the menu definitions that reference them.
//!
//! The built-in catalog ships as `assets/menus.json`. A deployment can point
//! `[menus] catalog` at its own file with the same shape.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{MenuDef, MenuItem, MenuNode, Variant};

const BUILTIN_CATALOG: &str = include_str!("../../assets/menus.json");

/// Icon key used when an item names no icon or an unknown one.
pub const BLANK_ICON: &str = "blank";

const BLANK_FALLBACK: &str =
    r#"<svg width="24" height="24" viewBox="0 0 24 24" aria-hidden="true"></svg>"#;

/// Named SVG icons.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IconRegistry(BTreeMap<String, String>);

impl IconRegistry {
    /// Markup for `key`, if registered.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// The blank icon.
    #[must_use]
    pub fn blank(&self) -> &str {
        self.get(BLANK_ICON).unwrap_or(BLANK_FALLBACK)
    }

    /// Markup for `key`, falling back to the blank icon.
    #[must_use]
    pub fn get_or_blank(&self, key: Option<&str>) -> &str {
        key.and_then(|k| self.get(k)).unwrap_or_else(|| self.blank())
    }

    /// Number of registered icons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no icons are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Nested destination table addressed by dotted paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HrefRegistry(Value);

impl HrefRegistry {
    /// Walks `path` (`"production.warehouse.onHold"`) and returns the string
    /// leaf, if any.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<&str> {
        path.split('.')
            .try_fold(&self.0, |node, segment| node.get(segment))
            .and_then(Value::as_str)
    }
}

/// A menu entry with icon and destination resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedNode {
    /// Section break.
    Separator,
    /// A concrete entry.
    Item(ResolvedItem),
}

/// Renderable item: icon markup and href are concrete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    /// Visible text.
    pub label: String,
    /// Icon markup.
    pub icon: String,
    /// Destination, when any.
    pub href: Option<String>,
    /// Link target.
    pub target: Option<String>,
    /// Visual variant.
    pub variant: Option<Variant>,
    /// Inline text color.
    pub color: Option<String>,
    /// Resolved nested entries.
    pub submenu: Vec<ResolvedNode>,
}

/// Problem found by [`Catalog::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogIssue {
    /// An `iconKey` with no registered icon.
    UnknownIcon {
        /// Menu key.
        menu: String,
        /// Item label.
        label: String,
        /// The missing icon key.
        key: String,
    },
    /// An `hrefKey` that does not reach a string leaf.
    UnresolvedHref {
        /// Menu key.
        menu: String,
        /// Item label.
        label: String,
        /// The dangling path.
        key: String,
    },
    /// A menu without any items.
    EmptyMenu {
        /// Menu key.
        menu: String,
    },
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownIcon { menu, label, key } => {
                write!(f, "{menu}: '{label}' uses unknown icon '{key}'")
            }
            Self::UnresolvedHref { menu, label, key } => {
                write!(f, "{menu}: '{label}' href key '{key}' does not resolve")
            }
            Self::EmptyMenu { menu } => write!(f, "{menu}: menu has no items"),
        }
    }
}

/// Icons, hrefs and menu definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Icon registry.
    #[serde(default)]
    pub icons: IconRegistry,
    /// Href registry.
    #[serde(default)]
    pub hrefs: HrefRegistry,
    /// Menus in mount order.
    #[serde(default)]
    pub menus: Vec<MenuDef>,
}

impl Catalog {
    /// The catalog compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded JSON is malformed.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG).context("Failed to parse built-in menu catalog")
    }

    /// Parses a catalog from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid catalog.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Invalid menu catalog JSON")
    }

    /// Loads a catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read menu catalog: {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Failed to load menu catalog: {}", path.display()))
    }

    /// Looks up a menu by key.
    #[must_use]
    pub fn menu(&self, key: &str) -> Option<&MenuDef> {
        self.menus.iter().find(|m| m.key == key)
    }

    /// Replaces (or appends) the items of menu `key`.
    pub fn set_menu(&mut self, key: &str, items: Vec<MenuNode>) {
        if let Some(menu) = self.menus.iter_mut().find(|m| m.key == key) {
            menu.items = items;
        } else {
            self.menus.push(MenuDef {
                key: key.to_string(),
                label: key.to_string(),
                items,
            });
        }
    }

    /// Resolves icon and href keys. Explicit `icon`/`href` win over keys;
    /// missing icons become the blank icon.
    #[must_use]
    pub fn resolve(&self, items: &[MenuNode]) -> Vec<ResolvedNode> {
        items
            .iter()
            .map(|node| match node {
                MenuNode::Separator => ResolvedNode::Separator,
                MenuNode::Item(item) => ResolvedNode::Item(self.resolve_item(item)),
            })
            .collect()
    }

    fn resolve_item(&self, item: &MenuItem) -> ResolvedItem {
        let icon = item
            .icon
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.icons.get_or_blank(item.icon_key.as_deref()).to_string());
        let href = item
            .href
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| {
                item.href_key
                    .as_deref()
                    .and_then(|k| self.hrefs.resolve(k))
                    .map(str::to_string)
            });
        ResolvedItem {
            label: item.label.clone(),
            icon,
            href,
            target: item.target.clone(),
            variant: item.variant,
            color: item.color.clone(),
            submenu: item
                .submenu
                .as_deref()
                .map(|s| self.resolve(s))
                .unwrap_or_default(),
        }
    }

    /// Reports dangling icon and href keys and empty menus.
    #[must_use]
    pub fn validate(&self) -> Vec<CatalogIssue> {
        let mut issues = Vec::new();
        for menu in &self.menus {
            if menu.items.is_empty() {
                issues.push(CatalogIssue::EmptyMenu {
                    menu: menu.key.clone(),
                });
            }
            self.validate_items(&menu.key, &menu.items, &mut issues);
        }
        issues
    }

    fn validate_items(&self, menu: &str, items: &[MenuNode], issues: &mut Vec<CatalogIssue>) {
        for node in items {
            let MenuNode::Item(item) = node else {
                continue;
            };
            if let Some(key) = &item.icon_key {
                if item.icon.is_none() && self.icons.get(key).is_none() {
                    issues.push(CatalogIssue::UnknownIcon {
                        menu: menu.to_string(),
                        label: item.label.clone(),
                        key: key.clone(),
                    });
                }
            }
            if let Some(key) = &item.href_key {
                if item.href.is_none() && self.hrefs.resolve(key).is_none() {
                    issues.push(CatalogIssue::UnresolvedHref {
                        menu: menu.to_string(),
                        label: item.label.clone(),
                        key: key.clone(),
                    });
                }
            }
            if let Some(sub) = &item.submenu {
                self.validate_items(menu, sub, issues);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_clean() {
        let catalog = Catalog::builtin().unwrap();
        let keys: Vec<_> = catalog.menus.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, ["processing", "production", "shipping", "accounts"]);
        assert!(catalog.validate().is_empty(), "{:?}", catalog.validate());
        assert!(catalog.icons.get(BLANK_ICON).is_some());
    }

    #[test]
    fn test_href_paths() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(
            catalog.hrefs.resolve("processing.orderPending"),
            Some("?p=orders&sales_status=Pending")
        );
        assert_eq!(catalog.hrefs.resolve("processing"), None);
        assert_eq!(catalog.hrefs.resolve("processing.nope.deeper"), None);
        assert_eq!(catalog.hrefs.resolve(""), None);
    }

    #[test]
    fn test_resolve_prefers_explicit_values() {
        let catalog = Catalog::builtin().unwrap();
        let item = MenuItem {
            icon_key: Some("poPending".into()),
            icon: Some("<svg id=\"x\"></svg>".into()),
            href_key: Some("processing.poPending".into()),
            href: Some("/explicit".into()),
            ..MenuItem::new("Both")
        };
        let missing = MenuItem {
            icon_key: Some("doesNotExist".into()),
            ..MenuItem::new("Missing")
        };
        let resolved = catalog.resolve(&[MenuNode::Item(item), MenuNode::Item(missing)]);
        let ResolvedNode::Item(first) = &resolved[0] else {
            panic!("expected item");
        };
        assert_eq!(first.icon, "<svg id=\"x\"></svg>");
        assert_eq!(first.href.as_deref(), Some("/explicit"));
        let ResolvedNode::Item(second) = &resolved[1] else {
            panic!("expected item");
        };
        assert_eq!(second.icon, catalog.icons.blank());
        assert_eq!(second.href, None);
    }

    #[test]
    fn test_validate_reports_dangling_keys() {
        let mut catalog = Catalog::builtin().unwrap();
        catalog.set_menu(
            "custom",
            vec![MenuNode::Item(MenuItem {
                icon_key: Some("ghost".into()),
                href_key: Some("nowhere.at.all".into()),
                ..MenuItem::new("Broken")
            })],
        );
        catalog.set_menu("empty", Vec::new());
        let issues = catalog.validate();
        assert_eq!(issues.len(), 3);
        assert!(issues[0].to_string().contains("ghost"));
        assert!(matches!(issues[2], CatalogIssue::EmptyMenu { .. }));
    }
}
