//! Customizable hotbuttons: per-key icon, link and label.
//!
//! Buttons are `.iconDiv.hotbutton[data-key]` elements holding an `.iconSVG`
//! host and a `.text` label. The markup present at mount time is the default
//! that a cleared button returns to. Configs persist under `hotbutton:<key>`.

pub mod editor;
pub mod svg;

pub use editor::{normalize_svg_input, HotbuttonEditor};
pub use svg::{sanitize_svg, SvgError, INVALID_SVG_MESSAGE};

use serde::{Deserialize, Serialize};

use crate::constants::HOTBUTTON_STORAGE_PREFIX;
use crate::dom::{Document, NodeId};
use crate::hover::Modifiers;
use crate::menu::Navigation;
use crate::storage::Storage;

/// Saved customization of one hotbutton.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotbuttonConfig {
    /// Sanitized icon markup.
    #[serde(default)]
    pub svg: Option<String>,
    /// Destination.
    #[serde(default)]
    pub href: String,
    /// Label override.
    #[serde(default)]
    pub label: String,
}

impl HotbuttonConfig {
    /// True when no field carries a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.svg.as_deref().map_or(true, str::is_empty) && self.href.is_empty() && self.label.is_empty()
    }
}

/// Storage key for hotbutton `key`.
#[must_use]
pub fn storage_key(key: &str) -> String {
    format!("{HOTBUTTON_STORAGE_PREFIX}{key}")
}

/// Reads the saved config for `key`.
#[must_use]
pub fn load_config(storage: &Storage, key: &str) -> Option<HotbuttonConfig> {
    storage.read_json(&storage_key(key))
}

/// Validates and persists a config. Empty input removes the entry and
/// returns `Ok(None)`.
///
/// # Errors
///
/// Returns [`SvgError`] when a non-empty SVG is rejected; nothing is written.
pub fn store_config(
    storage: &Storage,
    key: &str,
    svg: &str,
    href: &str,
    label: &str,
) -> Result<Option<HotbuttonConfig>, SvgError> {
    let (svg, href, label) = (svg.trim(), href.trim(), label.trim());
    if svg.is_empty() && href.is_empty() && label.is_empty() {
        storage.remove(&storage_key(key));
        return Ok(None);
    }
    let svg = if svg.is_empty() {
        None
    } else {
        Some(sanitize_svg(svg)?)
    };
    let config = HotbuttonConfig {
        svg,
        href: href.to_string(),
        label: label.to_string(),
    };
    storage.write_json(&storage_key(key), &config);
    Ok(Some(config))
}

/// Removes the saved config for `key`.
pub fn clear_config(storage: &Storage, key: &str) {
    storage.remove(&storage_key(key));
}

/// Result of clicking a hotbutton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotbuttonClick {
    /// The target is not a hotbutton.
    Ignored,
    /// Alt-click opened the editor.
    EditorOpened,
    /// Follow the configured link.
    Navigate(Navigation),
    /// A hotbutton without a link.
    Unset,
}

#[derive(Debug, Clone)]
struct Hotbutton {
    node: NodeId,
    key: String,
    default_icon: String,
    default_label: String,
    default_aria: String,
}

/// Mounted hotbuttons plus their editor.
#[derive(Debug)]
pub struct Hotbuttons {
    storage: Storage,
    buttons: Vec<Hotbutton>,
    editor: HotbuttonEditor,
}

impl Hotbuttons {
    /// Finds hotbuttons, remembers their defaults and applies saved configs.
    pub fn mount(doc: &mut Document, storage: Storage) -> Self {
        let nodes = doc.query_all(doc.root(), |d, n| {
            d.has_class(n, "iconDiv")
                && d.has_class(n, "hotbutton")
                && d.attr(n, "data-key").is_some_and(|k| !k.is_empty())
        });
        let buttons = nodes
            .into_iter()
            .filter_map(|node| {
                let key = doc.attr(node, "data-key")?.to_string();
                let default_icon = icon_host(doc, node)
                    .map(|h| doc.inner_html(h))
                    .unwrap_or_default();
                let default_label = label_node(doc, node)
                    .map(|s| doc.text_content(s))
                    .unwrap_or_default();
                let default_aria = doc.attr(node, "aria-label").unwrap_or_default().to_string();
                Some(Hotbutton {
                    node,
                    key,
                    default_icon,
                    default_label,
                    default_aria,
                })
            })
            .collect();
        let editor = HotbuttonEditor::mount(doc);
        let this = Self {
            storage,
            buttons,
            editor,
        };
        for i in 0..this.buttons.len() {
            this.apply(doc, i);
        }
        tracing::debug!("Mounted {} hotbuttons", this.buttons.len());
        this
    }

    /// Number of mounted buttons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    /// True when the page has no hotbuttons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    /// Keys in document order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.buttons.iter().map(|b| b.key.as_str()).collect()
    }

    /// Button node for `key`.
    #[must_use]
    pub fn node(&self, key: &str) -> Option<NodeId> {
        self.buttons.iter().find(|b| b.key == key).map(|b| b.node)
    }

    /// Index of the button containing `target`.
    #[must_use]
    pub fn button_at(&self, doc: &Document, target: NodeId) -> Option<usize> {
        self.buttons.iter().position(|b| doc.contains(b.node, target))
    }

    /// The editor dialog.
    #[must_use]
    pub const fn editor(&self) -> &HotbuttonEditor {
        &self.editor
    }

    /// Paints button `index` from its saved config or its defaults.
    pub fn apply(&self, doc: &mut Document, index: usize) {
        let Some(button) = self.buttons.get(index) else {
            return;
        };
        let btn = button.node;
        let saved = load_config(&self.storage, &button.key);
        if self.storage.contains(&storage_key(&button.key)) {
            doc.remove_attr(btn, "data-tooltip");
        } else {
            doc.set_attr(btn, "data-tooltip", "Not set");
        }
        let Some(host) = icon_host(doc, btn) else {
            return;
        };

        let config = saved.filter(|c| !c.is_empty());
        let Some(config) = config else {
            doc.set_markup(host, &button.default_icon);
            self.restore_label(doc, button);
            doc.remove_attr(btn, "data-href");
            doc.remove_attr(btn, "title");
            return;
        };

        if let Some(raw) = config.svg.as_deref().filter(|s| !s.is_empty()) {
            match sanitize_svg(raw) {
                Ok(svg) => doc.set_markup(host, &svg),
                Err(e) => tracing::warn!("Ignoring saved icon for {}: {e}", button.key),
            }
        }

        if config.href.is_empty() {
            doc.remove_attr(btn, "data-href");
            doc.remove_attr(btn, "title");
        } else {
            doc.set_attr(btn, "data-href", &config.href);
            if doc.attr(btn, "title").map_or(true, str::is_empty) {
                doc.set_attr(btn, "title", &config.href);
            }
        }

        if config.label.is_empty() {
            self.restore_label(doc, button);
        } else {
            if let Some(span) = label_node(doc, btn) {
                doc.set_text(span, &config.label);
            }
            doc.set_attr(btn, "aria-label", &config.label);
        }
    }

    fn restore_label(&self, doc: &mut Document, button: &Hotbutton) {
        if let Some(span) = label_node(doc, button.node) {
            doc.set_text(span, &button.default_label);
        }
        if button.default_aria.is_empty() {
            doc.remove_attr(button.node, "aria-label");
        } else {
            doc.set_attr(button.node, "aria-label", &button.default_aria);
        }
    }

    fn apply_key(&self, doc: &mut Document, key: &str) {
        if let Some(i) = self.buttons.iter().position(|b| b.key == key) {
            self.apply(doc, i);
        }
    }

    /// Handles a click on (or inside) a hotbutton.
    pub fn click(&mut self, doc: &mut Document, target: NodeId, mods: Modifiers) -> HotbuttonClick {
        let Some(index) = self.button_at(doc, target) else {
            return HotbuttonClick::Ignored;
        };
        let key = self.buttons[index].key.clone();
        if mods.alt {
            self.open_editor(doc, &key);
            return HotbuttonClick::EditorOpened;
        }
        match load_config(&self.storage, &key) {
            Some(cfg) if !cfg.href.is_empty() => {
                let nav = if mods.ctrl || mods.meta {
                    Navigation::new_tab(&cfg.href)
                } else {
                    Navigation::same_tab(&cfg.href)
                };
                HotbuttonClick::Navigate(nav)
            }
            _ => HotbuttonClick::Unset,
        }
    }

    /// Opens the editor for `key`. The label is prefilled from the saved
    /// label, then `aria-label`, then the visible text.
    pub fn open_editor(&mut self, doc: &mut Document, key: &str) {
        let Some(btn) = self.node(key) else {
            return;
        };
        let current = load_config(&self.storage, key).unwrap_or_default();
        let label = [
            Some(current.label.clone()),
            doc.attr(btn, "aria-label").map(str::to_string),
            label_node(doc, btn).map(|s| doc.text_content(s)),
        ]
        .into_iter()
        .flatten()
        .find(|l| !l.is_empty())
        .unwrap_or_default();
        self.editor.open(doc, key, &current, &label);
    }

    /// Updates the SVG field of the open editor.
    pub fn editor_input_svg(&self, doc: &mut Document, raw: &str) {
        self.editor.input_svg(doc, raw);
    }

    /// Updates the link field of the open editor.
    pub fn editor_input_link(&self, doc: &mut Document, value: &str) {
        self.editor.input_link(doc, value);
    }

    /// Updates the label field of the open editor.
    pub fn editor_input_label(&self, doc: &mut Document, value: &str) {
        self.editor.input_label(doc, value);
    }

    /// Saves the editor fields. All-empty removes the config. A rejected
    /// SVG shows [`INVALID_SVG_MESSAGE`] and keeps the dialog open.
    ///
    /// # Errors
    ///
    /// Returns the [`SvgError`] that blocked the save.
    pub fn editor_save(&mut self, doc: &mut Document) -> Result<Option<HotbuttonConfig>, SvgError> {
        let Some(key) = self.editor.target_key().map(str::to_string) else {
            return Ok(None);
        };
        let (svg, href, label) = self.editor.fields(doc);
        match store_config(&self.storage, &key, &svg, &href, &label) {
            Ok(saved) => {
                self.apply_key(doc, &key);
                self.editor.close(doc);
                tracing::info!("Saved hotbutton {key}");
                Ok(saved)
            }
            Err(e) => {
                self.editor.show_error(doc, e.user_message());
                Err(e)
            }
        }
    }

    /// Removes the config of the edited key; the dialog stays open with
    /// empty fields.
    pub fn editor_clear(&mut self, doc: &mut Document) {
        let Some(key) = self.editor.target_key().map(str::to_string) else {
            return;
        };
        clear_config(&self.storage, &key);
        self.apply_key(doc, &key);
        self.editor.reset_fields(doc);
    }

    /// Closes the editor without saving.
    pub fn editor_cancel(&mut self, doc: &mut Document) {
        self.editor.close(doc);
    }

    /// Escape closes an open editor. Returns true when consumed.
    pub fn escape(&mut self, doc: &mut Document) -> bool {
        if self.editor.is_open(doc) {
            self.editor.close(doc);
            true
        } else {
            false
        }
    }

    /// Persists a config for `key` outside the editor and repaints.
    ///
    /// # Errors
    ///
    /// Returns [`SvgError`] when the SVG is rejected.
    pub fn set_config(
        &mut self,
        doc: &mut Document,
        key: &str,
        config: &HotbuttonConfig,
    ) -> Result<Option<HotbuttonConfig>, SvgError> {
        let saved = store_config(
            &self.storage,
            key,
            config.svg.as_deref().unwrap_or_default(),
            &config.href,
            &config.label,
        )?;
        self.apply_key(doc, key);
        Ok(saved)
    }

    /// Removes the config for `key` and restores its defaults.
    pub fn clear(&mut self, doc: &mut Document, key: &str) {
        clear_config(&self.storage, key);
        self.apply_key(doc, key);
    }
}

fn icon_host(doc: &Document, btn: NodeId) -> Option<NodeId> {
    doc.query(btn, |d, n| d.has_class(n, "iconSVG"))
}

fn label_node(doc: &Document, btn: NodeId) -> Option<NodeId> {
    doc.query(btn, |d, n| d.has_class(n, "text"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> (Document, NodeId) {
        let mut doc = Document::new();
        let btn = doc.create_element_with_class("div", "iconDiv hotbutton");
        doc.set_attr(btn, "data-key", "F2");
        doc.set_attr(btn, "aria-label", "Reports");
        let icon = doc.create_element_with_class("span", "iconSVG");
        doc.set_markup(icon, "<svg id=\"default\"></svg>");
        let text = doc.create_element_with_class("span", "text");
        doc.set_text(text, "Reports");
        doc.append_child(btn, icon);
        doc.append_child(btn, text);
        let body = doc.body();
        doc.append_child(body, btn);
        (doc, btn)
    }

    #[test]
    fn test_unset_tooltip_and_click() {
        let (mut doc, btn) = page();
        let mut hb = Hotbuttons::mount(&mut doc, Storage::in_memory());
        assert_eq!(doc.attr(btn, "data-tooltip"), Some("Not set"));
        assert_eq!(hb.click(&mut doc, btn, Modifiers::default()), HotbuttonClick::Unset);
    }

    #[test]
    fn test_config_applies_and_clears() {
        let (mut doc, btn) = page();
        let storage = Storage::in_memory();
        let mut hb = Hotbuttons::mount(&mut doc, storage.clone());
        let cfg = HotbuttonConfig {
            svg: Some("<svg><path d=\"M1 1\"/></svg>".into()),
            href: "/orders".into(),
            label: "Orders".into(),
        };
        hb.set_config(&mut doc, "F2", &cfg).unwrap();
        assert_eq!(doc.attr(btn, "data-href"), Some("/orders"));
        assert_eq!(doc.attr(btn, "title"), Some("/orders"));
        assert_eq!(doc.attr(btn, "aria-label"), Some("Orders"));
        assert_eq!(doc.attr(btn, "data-tooltip"), None);
        assert!(doc.to_html(btn).contains("currentColor"));

        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::default()
        };
        assert_eq!(
            hb.click(&mut doc, btn, ctrl),
            HotbuttonClick::Navigate(Navigation::new_tab("/orders"))
        );

        hb.clear(&mut doc, "F2");
        assert!(!storage.contains("hotbutton:F2"));
        assert_eq!(doc.attr(btn, "data-href"), None);
        assert_eq!(doc.attr(btn, "aria-label"), Some("Reports"));
        assert!(doc.to_html(btn).contains("id=\"default\""));
    }

    #[test]
    fn test_alt_click_opens_editor_prefilled() {
        let (mut doc, btn) = page();
        let mut hb = Hotbuttons::mount(&mut doc, Storage::in_memory());
        let alt = Modifiers {
            alt: true,
            ..Modifiers::default()
        };
        assert_eq!(hb.click(&mut doc, btn, alt), HotbuttonClick::EditorOpened);
        assert!(hb.editor().is_open(&doc));
        assert_eq!(hb.editor().fields(&doc).2, "Reports");
        assert!(hb.escape(&mut doc));
        assert!(!hb.editor().is_open(&doc));
    }

    #[test]
    fn test_editor_rejects_invalid_svg() {
        let (mut doc, _) = page();
        let storage = Storage::in_memory();
        let mut hb = Hotbuttons::mount(&mut doc, storage.clone());
        hb.open_editor(&mut doc, "F2");
        hb.editor_input_svg(&mut doc, "<div>nope</div>");
        let err = hb.editor_save(&mut doc).unwrap_err();
        assert!(matches!(err, SvgError::NotSvg(_)));
        assert!(hb.editor().is_open(&doc));
        assert_eq!(hb.editor().error_text(&doc).as_deref(), Some(INVALID_SVG_MESSAGE));
        assert!(!storage.contains("hotbutton:F2"));
    }

    #[test]
    fn test_editor_empty_save_removes() {
        let (mut doc, _) = page();
        let storage = Storage::in_memory();
        store_config(&storage, "F2", "", "/x", "").unwrap();
        let mut hb = Hotbuttons::mount(&mut doc, storage.clone());
        hb.open_editor(&mut doc, "F2");
        hb.editor_input_link(&mut doc, "  ");
        hb.editor_input_label(&mut doc, "");
        assert_eq!(hb.editor_save(&mut doc).unwrap(), None);
        assert!(!storage.contains("hotbutton:F2"));
        assert!(!hb.editor().is_open(&doc));
    }
}
