//! Declarative menu data.

use serde::{Deserialize, Serialize};

/// Visual variant of a menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Rendered with class `special`.
    Ok,
    /// Rendered with class `delete`.
    Warn,
    /// Any other value; no extra class.
    #[serde(other)]
    Plain,
}

impl Variant {
    /// CSS class for the variant.
    #[must_use]
    pub const fn class(self) -> Option<&'static str> {
        match self {
            Self::Ok => Some("special"),
            Self::Warn => Some("delete"),
            Self::Plain => None,
        }
    }
}

/// A clickable (or expandable) menu entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuItem {
    /// Visible text.
    pub label: String,
    /// Icon registry key.
    pub icon_key: Option<String>,
    /// Explicit icon markup; wins over `icon_key`.
    pub icon: Option<String>,
    /// Dotted path into the href registry.
    pub href_key: Option<String>,
    /// Explicit destination; wins over `href_key`.
    pub href: Option<String>,
    /// Optional visual variant.
    pub variant: Option<Variant>,
    /// Link target; `_self` when absent.
    pub target: Option<String>,
    /// Inline text color.
    pub color: Option<String>,
    /// Nested entries, rendered as a flyout.
    pub submenu: Option<Vec<MenuNode>>,
}

impl MenuItem {
    /// An item with only a label.
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Self::default()
        }
    }

    /// True when the item carries a non-empty submenu.
    #[must_use]
    pub fn has_submenu(&self) -> bool {
        self.submenu.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// One entry of a menu: a separator or an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawEntry", into = "RawEntry")]
pub enum MenuNode {
    /// Section break.
    Separator,
    /// A regular entry.
    Item(MenuItem),
}

/// Wire shape shared by separators and items: `{ "separator": true }` or
/// `{ "label": ..., "iconKey": ..., ... }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    separator: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    href_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variant: Option<Variant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    submenu: Option<Vec<MenuNode>>,
}

impl From<RawEntry> for MenuNode {
    fn from(raw: RawEntry) -> Self {
        if raw.separator {
            return Self::Separator;
        }
        Self::Item(MenuItem {
            label: raw.label,
            icon_key: raw.icon_key,
            icon: raw.icon,
            href_key: raw.href_key,
            href: raw.href,
            variant: raw.variant,
            target: raw.target,
            color: raw.color,
            submenu: raw.submenu,
        })
    }
}

impl From<MenuNode> for RawEntry {
    fn from(node: MenuNode) -> Self {
        match node {
            MenuNode::Separator => Self {
                separator: true,
                ..Self::default()
            },
            MenuNode::Item(item) => Self {
                separator: false,
                label: item.label,
                icon_key: item.icon_key,
                icon: item.icon,
                href_key: item.href_key,
                href: item.href,
                variant: item.variant,
                target: item.target,
                color: item.color,
                submenu: item.submenu,
            },
        }
    }
}

/// A top-level menu mounted into `#menu-{key}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuDef {
    /// Menu key (`processing`, `shipping`, ...).
    pub key: String,
    /// Label of the menubar trigger.
    pub label: String,
    /// Entries in display order.
    pub items: Vec<MenuNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries() {
        let json = r#"[
            {"label": "PO Pending", "iconKey": "poPending", "hrefKey": "processing.poPending", "variant": "ok"},
            {"separator": true},
            {"label": "Odd", "variant": "sparkly", "submenu": []}
        ]"#;
        let nodes: Vec<MenuNode> = serde_json::from_str(json).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[1], MenuNode::Separator);
        let MenuNode::Item(first) = &nodes[0] else {
            panic!("expected item");
        };
        assert_eq!(first.variant.and_then(Variant::class), Some("special"));
        let MenuNode::Item(odd) = &nodes[2] else {
            panic!("expected item");
        };
        assert_eq!(odd.variant, Some(Variant::Plain));
        assert!(!odd.has_submenu());
    }

    #[test]
    fn test_serialize_separator_compact() {
        let json = serde_json::to_string(&MenuNode::Separator).unwrap();
        assert_eq!(json, r#"{"separator":true}"#);
    }
}
