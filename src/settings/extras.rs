//! Extra display toggles (contrast filters).

use std::collections::BTreeMap;

use serde::Serialize;

use crate::bus::{EventBus, SubscriptionId};
use crate::constants::EXTRAS_STORAGE_KEY;
use crate::dom::Document;
use crate::storage::Storage;

/// One extra toggle and the page effect it drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraToggle {
    /// Checkbox id.
    pub id: &'static str,
    /// Tooltip and accessible name.
    pub tooltip: &'static str,
    /// Attribute written on the document root (`on`/`off`).
    pub root_attr: &'static str,
    /// Id of the injected `<style>` element.
    pub style_id: &'static str,
    /// Stylesheet injected once.
    pub css: &'static str,
}

/// The built-in extra toggles.
pub const EXTRA_TOGGLES: [ExtraToggle; 2] = [
    ExtraToggle {
        id: "extra-toggle-1",
        tooltip: "High Contrast",
        root_attr: "data-high-contrast",
        style_id: "hc-style",
        css: r#"html[data-high-contrast="on"] { filter: contrast(1.5); }"#,
    },
    ExtraToggle {
        id: "extra-toggle-2",
        tooltip: "Experimental Mode",
        root_attr: "data-low-contrast",
        style_id: "lc-style",
        css: r#"html[data-low-contrast="on"] { filter: contrast(0.8); }"#,
    },
];

/// Published on every [`Extras::set`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtraChange {
    /// Toggle id.
    pub id: String,
    /// New value.
    pub value: bool,
}

/// Extra toggles state, persisted as `{id: bool}`.
pub struct Extras {
    state: BTreeMap<String, bool>,
    storage: Storage,
    bus: EventBus<ExtraChange>,
}

impl std::fmt::Debug for Extras {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extras").field("state", &self.state).finish_non_exhaustive()
    }
}

impl Extras {
    /// Loads saved state; unreadable blobs count as empty.
    pub fn load(storage: Storage) -> Self {
        let state = storage.read_json(EXTRAS_STORAGE_KEY).unwrap_or_default();
        Self {
            state,
            storage,
            bus: EventBus::new(),
        }
    }

    /// Current value; unknown ids are off.
    #[must_use]
    pub fn get(&self, id: &str) -> bool {
        self.state.get(id).copied().unwrap_or(false)
    }

    /// Sets a toggle, persists and publishes. Unknown ids are ignored.
    pub fn set(&mut self, id: &str, value: bool) -> Option<ExtraChange> {
        EXTRA_TOGGLES.iter().find(|t| t.id == id)?;
        self.state.insert(id.to_string(), value);
        self.storage.write_json(EXTRAS_STORAGE_KEY, &self.state);
        let change = ExtraChange {
            id: id.to_string(),
            value,
        };
        self.bus.publish(id, &change);
        Some(change)
    }

    /// Subscribes to one toggle.
    pub fn subscribe<F>(&mut self, id: &str, handler: F) -> SubscriptionId
    where
        F: FnMut(&ExtraChange) + Send + 'static,
    {
        self.bus.subscribe(id, handler)
    }

    /// Subscribes to every toggle.
    pub fn subscribe_all<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&ExtraChange) + Send + 'static,
    {
        self.bus.subscribe_all(handler)
    }

    /// Removes a subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Snapshot of every toggle.
    #[must_use]
    pub fn list(&self) -> Vec<ExtraChange> {
        EXTRA_TOGGLES
            .iter()
            .map(|t| ExtraChange {
                id: t.id.to_string(),
                value: self.get(t.id),
            })
            .collect()
    }
}

/// Builds the checkbox column for the extra toggles inside `panel`.
pub fn render_extras(doc: &mut Document, panel: crate::dom::NodeId, extras: &Extras) {
    if doc.element_by_id("extra-toggle-col").is_some() {
        return;
    }
    let col = doc.create_element("div");
    doc.set_attr(col, "id", "extra-toggle-col");
    for toggle in &EXTRA_TOGGLES {
        let label = doc.create_element_with_class("label", "data-tooltip extra-toggle");
        doc.set_attr(label, "data-tooltip-content", toggle.tooltip);
        doc.set_attr(label, "title", toggle.tooltip);

        let input = doc.create_element("input");
        doc.set_attr(input, "type", "checkbox");
        doc.set_attr(input, "id", toggle.id);
        doc.set_attr(input, "name", toggle.id);
        doc.set_attr(input, "aria-label", toggle.tooltip);
        let on = extras.get(toggle.id);
        doc.toggle_attr(input, "checked", on);
        doc.set_attr(input, "aria-checked", if on { "true" } else { "false" });

        let box_el = doc.create_element_with_class("span", "custom-checkbox");
        doc.set_attr(box_el, "aria-hidden", "true");

        doc.append_child(label, input);
        doc.append_child(label, box_el);
        doc.append_child(col, label);
    }
    doc.append_child(panel, col);
}

/// Applies a toggle's page effect: injects its stylesheet once, writes the
/// root attribute and syncs the checkbox.
pub fn apply_extra(doc: &mut Document, id: &str, on: bool) {
    let Some(toggle) = EXTRA_TOGGLES.iter().find(|t| t.id == id) else {
        return;
    };
    if doc.element_by_id(toggle.style_id).is_none() {
        let style = doc.create_element("style");
        doc.set_attr(style, "id", toggle.style_id);
        doc.set_markup(style, toggle.css);
        let head = doc.head();
        doc.append_child(head, style);
    }
    let root = doc.root();
    doc.set_attr(root, toggle.root_attr, if on { "on" } else { "off" });
    if let Some(input) = doc.element_by_id(toggle.id) {
        doc.toggle_attr(input, "checked", on);
        doc.set_attr(input, "aria-checked", if on { "true" } else { "false" });
    }
}
