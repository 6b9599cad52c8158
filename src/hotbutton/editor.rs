//! The hotbutton editor dialog.

use crate::dom::{Document, NodeId};

use super::svg::sanitize_svg;
use super::HotbuttonConfig;

/// Collapses runs of CR/LF/TAB into a single space.
#[must_use]
pub fn normalize_svg_input(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_run = false;
    for c in raw.chars() {
        if matches!(c, '\r' | '\n' | '\t') {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Dialog nodes plus the key being edited.
#[derive(Debug, Clone)]
pub struct HotbuttonEditor {
    host: NodeId,
    title: NodeId,
    preview: NodeId,
    svg_input: NodeId,
    link_input: NodeId,
    label_input: NodeId,
    error: NodeId,
    target: Option<String>,
}

impl HotbuttonEditor {
    /// Builds the hidden dialog under `<body>`, or adopts an existing
    /// `#hb-config-host`.
    pub fn mount(doc: &mut Document) -> Self {
        if let Some(editor) = Self::adopt(doc) {
            return editor;
        }
        let host = doc.create_element("div");
        doc.set_attr(host, "id", "hb-config-host");
        doc.set_attr(host, "hidden", "");
        let panel = doc.create_element_with_class("section", "panel hb-panel");
        doc.set_attr(panel, "role", "dialog");
        doc.set_attr(panel, "aria-labelledby", "hb-title");
        doc.append_child(host, panel);

        let title = element_with_id(doc, panel, "h2", "hb-title");
        doc.set_text(title, "Hot Button");
        let preview = element_with_id(doc, panel, "div", "hb-icon");
        doc.add_class(preview, "box");

        let svg_input = element_with_id(doc, panel, "textarea", "hb-svg");
        doc.set_attr(svg_input, "placeholder", "SVG: <svg>…</svg>");
        let link_input = element_with_id(doc, panel, "input", "hb-link");
        doc.set_attr(link_input, "type", "url");
        doc.set_attr(link_input, "placeholder", "Link: https://example.com/page");
        let label_input = element_with_id(doc, panel, "input", "hb-label");
        doc.set_attr(label_input, "type", "text");
        doc.set_attr(label_input, "placeholder", "LABEL: Icons");
        let error = element_with_id(doc, panel, "div", "hb-error");
        doc.set_attr(error, "role", "alert");
        doc.set_attr(error, "hidden", "");

        for (id, text) in [
            ("hb-cancel", "Cancel (Esc)"),
            ("hb-clear", "Clear"),
            ("hb-save", "Save"),
        ] {
            let button = element_with_id(doc, panel, "button", id);
            doc.set_attr(button, "type", "button");
            doc.set_text(button, text);
        }

        let body = doc.body();
        doc.append_child(body, host);
        Self {
            host,
            title,
            preview,
            svg_input,
            link_input,
            label_input,
            error,
            target: None,
        }
    }

    fn adopt(doc: &Document) -> Option<Self> {
        Some(Self {
            host: doc.element_by_id("hb-config-host")?,
            title: doc.element_by_id("hb-title")?,
            preview: doc.element_by_id("hb-icon")?,
            svg_input: doc.element_by_id("hb-svg")?,
            link_input: doc.element_by_id("hb-link")?,
            label_input: doc.element_by_id("hb-label")?,
            error: doc.element_by_id("hb-error")?,
            target: None,
        })
    }

    /// The dialog root.
    #[must_use]
    pub const fn host(&self) -> NodeId {
        self.host
    }

    /// Key being edited while open.
    #[must_use]
    pub fn target_key(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// True while the dialog is visible.
    #[must_use]
    pub fn is_open(&self, doc: &Document) -> bool {
        self.target.is_some() && !doc.has_attr(self.host, "hidden")
    }

    /// Shows the dialog for `key`, prefilled from `current`.
    pub fn open(&mut self, doc: &mut Document, key: &str, current: &HotbuttonConfig, label: &str) {
        self.target = Some(key.to_string());
        doc.set_text(self.title, &format!("Hot Key: {key}"));
        let svg = current.svg.clone().unwrap_or_default();
        doc.set_text(self.svg_input, &svg);
        doc.set_attr(self.link_input, "value", &current.href);
        doc.set_attr(self.label_input, "value", label);
        self.refresh_preview(doc);
        self.hide_error(doc);
        doc.remove_attr(self.host, "hidden");
    }

    /// Hides the dialog and resets every field.
    pub fn close(&mut self, doc: &mut Document) {
        self.target = None;
        self.reset_fields(doc);
        doc.set_attr(self.host, "hidden", "");
    }

    /// Empties inputs and preview, keeping the dialog open.
    pub fn reset_fields(&self, doc: &mut Document) {
        doc.clear_children(self.preview);
        doc.clear_children(self.svg_input);
        doc.set_attr(self.link_input, "value", "");
        doc.set_attr(self.label_input, "value", "");
        self.hide_error(doc);
    }

    /// Replaces the SVG field, normalizing whitespace and refreshing the
    /// preview.
    pub fn input_svg(&self, doc: &mut Document, raw: &str) {
        doc.set_text(self.svg_input, &normalize_svg_input(raw));
        self.refresh_preview(doc);
    }

    /// Replaces the link field.
    pub fn input_link(&self, doc: &mut Document, value: &str) {
        doc.set_attr(self.link_input, "value", value);
    }

    /// Replaces the label field.
    pub fn input_label(&self, doc: &mut Document, value: &str) {
        doc.set_attr(self.label_input, "value", value);
    }

    /// Trimmed `(svg, link, label)` field values.
    #[must_use]
    pub fn fields(&self, doc: &Document) -> (String, String, String) {
        let value = |n: NodeId| doc.attr(n, "value").unwrap_or_default().trim().to_string();
        (
            doc.text_content(self.svg_input).trim().to_string(),
            value(self.link_input),
            value(self.label_input),
        )
    }

    /// Current preview markup.
    #[must_use]
    pub fn preview_html(&self, doc: &Document) -> String {
        doc.inner_html(self.preview)
    }

    /// Shows `message` in the dialog.
    pub fn show_error(&self, doc: &mut Document, message: &str) {
        doc.set_text(self.error, message);
        doc.remove_attr(self.error, "hidden");
    }

    fn hide_error(&self, doc: &mut Document) {
        doc.clear_children(self.error);
        doc.set_attr(self.error, "hidden", "");
    }

    /// Visible error text, if any.
    #[must_use]
    pub fn error_text(&self, doc: &Document) -> Option<String> {
        (!doc.has_attr(self.error, "hidden")).then(|| doc.text_content(self.error))
    }

    fn refresh_preview(&self, doc: &mut Document) {
        let raw = doc.text_content(self.svg_input);
        let markup = match raw.trim() {
            "" => String::new(),
            raw => sanitize_svg(raw).unwrap_or_default(),
        };
        doc.set_markup(self.preview, &markup);
    }
}

fn element_with_id(doc: &mut Document, parent: NodeId, tag: &str, id: &str) -> NodeId {
    let node = doc.create_element(tag);
    doc.set_attr(node, "id", id);
    doc.append_child(parent, node);
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_svg_input() {
        assert_eq!(normalize_svg_input("<svg>\r\n\t<g/>\n</svg>"), "<svg> <g/> </svg>");
        assert_eq!(normalize_svg_input("plain"), "plain");
    }

    #[test]
    fn test_open_prefills_and_close_resets() {
        let mut doc = Document::new();
        let mut editor = HotbuttonEditor::mount(&mut doc);
        assert!(!editor.is_open(&doc));
        let cfg = HotbuttonConfig {
            svg: Some("<svg></svg>".into()),
            href: "/go".into(),
            label: String::new(),
        };
        editor.open(&mut doc, "F1", &cfg, "Fallback");
        assert!(editor.is_open(&doc));
        let title = doc.element_by_id("hb-title").unwrap();
        assert_eq!(doc.text_content(title), "Hot Key: F1");
        assert_eq!(
            editor.fields(&doc),
            ("<svg></svg>".into(), "/go".into(), "Fallback".into())
        );
        assert!(editor.preview_html(&doc).contains("currentColor"));

        editor.close(&mut doc);
        assert!(!editor.is_open(&doc));
        assert_eq!(editor.fields(&doc), (String::new(), String::new(), String::new()));
        assert_eq!(editor.preview_html(&doc), "");
    }

    #[test]
    fn test_invalid_input_clears_preview() {
        let mut doc = Document::new();
        let editor = HotbuttonEditor::mount(&mut doc);
        editor.input_svg(&mut doc, "<svg></svg>");
        assert!(!editor.preview_html(&doc).is_empty());
        editor.input_svg(&mut doc, "<svg>");
        assert_eq!(editor.preview_html(&doc), "");
    }

    #[test]
    fn test_mount_is_idempotent() {
        let mut doc = Document::new();
        let first = HotbuttonEditor::mount(&mut doc);
        let second = HotbuttonEditor::mount(&mut doc);
        assert_eq!(first.host(), second.host());
    }
}
