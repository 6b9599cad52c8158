//! Settings panel: disclosure, persisted form values and tooltip cool-down.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::constants::{SETTINGS_MENU_STORAGE_KEY, TOOLTIP_REARM};
use crate::dom::{Document, NodeId};
use crate::expandable::Expandables;
use crate::storage::Storage;
use crate::timer::{earliest, Timer};

/// The `#settings-toggle` button and the `#menu-settings` panel it opens.
#[derive(Debug, Clone)]
pub struct SettingsPanel {
    button: NodeId,
    panel: NodeId,
    hotzone: Option<NodeId>,
    storage: Storage,
}

impl SettingsPanel {
    /// Wires the panel if both elements exist. Starts closed; the open state
    /// is never persisted. Saved form values are restored.
    pub fn mount(doc: &mut Document, expandables: &mut Expandables, storage: Storage) -> Option<Self> {
        let button = doc.element_by_id("settings-toggle")?;
        let panel = doc.element_by_id("menu-settings")?;
        doc.set_attr(button, "aria-controls", "menu-settings");
        expandables.set_expanded(doc, button, false);

        let this = Self {
            button,
            panel,
            hotzone: doc.element_by_id("settingsHotzone"),
            storage,
        };
        this.sync_hotzone(doc);
        this.hydrate(doc);
        Some(this)
    }

    /// The toggle button.
    #[must_use]
    pub const fn button(&self) -> NodeId {
        self.button
    }

    /// The panel element.
    #[must_use]
    pub const fn panel(&self) -> NodeId {
        self.panel
    }

    /// Whether `node` is the button, the hotzone or inside the panel.
    #[must_use]
    pub fn owns(&self, doc: &Document, node: NodeId) -> bool {
        doc.contains(self.button, node)
            || doc.contains(self.panel, node)
            || self.hotzone.is_some_and(|h| doc.contains(h, node))
    }

    /// Whether the hotzone (a second click target for the button) contains `node`.
    #[must_use]
    pub fn is_hotzone(&self, doc: &Document, node: NodeId) -> bool {
        self.hotzone.is_some_and(|h| doc.contains(h, node))
    }

    /// Whether the panel is open.
    #[must_use]
    pub fn is_open(&self, doc: &Document) -> bool {
        Expandables::is_expanded(doc, self.button)
    }

    /// Opens or closes the panel.
    pub fn set_open(&self, doc: &mut Document, expandables: &mut Expandables, open: bool) {
        expandables.set_expanded(doc, self.button, open);
        self.sync_hotzone(doc);
    }

    /// Flips the panel.
    pub fn toggle(&self, doc: &mut Document, expandables: &mut Expandables) {
        let open = self.is_open(doc);
        self.set_open(doc, expandables, !open);
    }

    /// Mirrors the button's `aria-expanded` onto the hotzone.
    pub fn sync_hotzone(&self, doc: &mut Document) {
        if let Some(hotzone) = self.hotzone {
            let value = doc.attr(self.button, "aria-expanded").unwrap_or("false").to_string();
            doc.set_attr(hotzone, "aria-expanded", &value);
        }
    }

    fn form(&self, doc: &Document) -> Option<NodeId> {
        doc.query(self.panel, |d, n| d.tag(n) == Some("form"))
    }

    fn controls(doc: &Document, form: NodeId) -> Vec<NodeId> {
        doc.query_all(form, |d, n| {
            matches!(d.tag(n), Some("input" | "select" | "textarea")) && d.has_attr(n, "name")
        })
    }

    fn is_checkable(doc: &Document, node: NodeId) -> bool {
        matches!(doc.attr(node, "type"), Some("checkbox" | "radio"))
    }

    /// Current form entries, with browser form-data semantics: unchecked
    /// boxes are skipped and later duplicates win.
    #[must_use]
    pub fn form_values(&self, doc: &Document) -> BTreeMap<String, String> {
        let mut values = BTreeMap::new();
        let Some(form) = self.form(doc) else {
            return values;
        };
        for control in Self::controls(doc, form) {
            if doc.has_attr(control, "disabled") {
                continue;
            }
            let name = doc.attr(control, "name").unwrap_or_default().to_string();
            let value = if Self::is_checkable(doc, control) {
                if !doc.has_attr(control, "checked") {
                    continue;
                }
                doc.attr(control, "value").unwrap_or("on").to_string()
            } else {
                doc.attr(control, "value").unwrap_or_default().to_string()
            };
            values.insert(name, value);
        }
        values
    }

    /// Restores saved `{values}` into the form.
    pub fn hydrate(&self, doc: &mut Document) {
        let Some(form) = self.form(doc) else {
            return;
        };
        let saved: Map<String, Value> = self.storage.read_json(SETTINGS_MENU_STORAGE_KEY).unwrap_or_default();
        let Some(Value::Object(values)) = saved.get("values") else {
            return;
        };
        for control in Self::controls(doc, form) {
            let name = doc.attr(control, "name").unwrap_or_default().to_string();
            let Some(value) = values.get(&name) else {
                continue;
            };
            let value = value.as_str().map_or_else(|| value.to_string(), str::to_string);
            if Self::is_checkable(doc, control) {
                let own = doc.attr(control, "value").unwrap_or("on").to_string();
                doc.toggle_attr(control, "checked", own == value);
            } else {
                doc.set_attr(control, "value", &value);
            }
        }
    }

    /// Persists the form after a change, keeping other keys in the blob.
    pub fn form_changed(&self, doc: &Document) {
        if self.form(doc).is_none() {
            return;
        }
        let mut saved: Map<String, Value> = self.storage.read_json(SETTINGS_MENU_STORAGE_KEY).unwrap_or_default();
        let values: Map<String, Value> = self
            .form_values(doc)
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        saved.insert("values".to_string(), Value::Object(values));
        self.storage.write_json(SETTINGS_MENU_STORAGE_KEY, &saved);
    }
}

/// Suspends a tooltip host after activation so the tooltip does not cover
/// the control the user just used.
#[derive(Debug, Clone)]
pub struct TooltipCooldown {
    rearm: Duration,
    timers: Vec<(NodeId, Timer)>,
}

impl Default for TooltipCooldown {
    fn default() -> Self {
        Self::new(TOOLTIP_REARM)
    }
}

impl TooltipCooldown {
    /// Creates a cool-down with the given re-arm delay.
    #[must_use]
    pub fn new(rearm: Duration) -> Self {
        Self {
            rearm,
            timers: Vec::new(),
        }
    }

    /// Handles a pointer-up or Enter/Space inside `scope`.
    pub fn activate(&mut self, doc: &mut Document, scope: NodeId, target: NodeId, now: Duration) {
        let Some(host) = doc.closest_class(target, "data-tooltip") else {
            return;
        };
        if doc.contains(scope, host) {
            self.suspend(doc, host, now);
        }
    }

    /// Marks `host` with `data-tip-suspend` and (re)starts its timer.
    pub fn suspend(&mut self, doc: &mut Document, host: NodeId, now: Duration) {
        doc.set_attr(host, "data-tip-suspend", "");
        if let Some((_, timer)) = self.timers.iter_mut().find(|(n, _)| *n == host) {
            timer.arm(now, self.rearm);
        } else {
            let mut timer = Timer::default();
            timer.arm(now, self.rearm);
            self.timers.push((host, timer));
        }
    }

    /// Lifts expired suspensions.
    pub fn tick(&mut self, doc: &mut Document, now: Duration) {
        self.timers.retain_mut(|(host, timer)| {
            if timer.fire(now) {
                doc.remove_attr(*host, "data-tip-suspend");
                false
            } else {
                true
            }
        });
    }

    /// Earliest pending re-arm.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        earliest(self.timers.iter().map(|(_, t)| t.deadline()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let btn = doc.create_element("button");
        doc.set_attr(btn, "id", "settings-toggle");
        let hot = doc.create_element("div");
        doc.set_attr(hot, "id", "settingsHotzone");
        let panel = doc.create_element("div");
        doc.set_attr(panel, "id", "menu-settings");
        let form = doc.create_element("form");
        let text = doc.create_element("input");
        doc.set_attr(text, "name", "density");
        doc.set_attr(text, "value", "cozy");
        let check = doc.create_element("input");
        doc.set_attr(check, "name", "compact");
        doc.set_attr(check, "type", "checkbox");
        doc.append_child(form, text);
        doc.append_child(form, check);
        doc.append_child(panel, form);
        for n in [btn, hot, panel] {
            doc.append_child(body, n);
        }
        (doc, text, check)
    }

    #[test]
    fn test_form_values_round_through_storage() {
        let storage = Storage::in_memory();
        let (mut doc, text, check) = page();
        let mut ex = Expandables::new();
        let panel = SettingsPanel::mount(&mut doc, &mut ex, storage.clone()).unwrap();

        doc.set_attr(text, "value", "compact");
        doc.toggle_attr(check, "checked", true);
        panel.form_changed(&doc);

        let (mut fresh, text2, check2) = page();
        let mut ex2 = Expandables::new();
        SettingsPanel::mount(&mut fresh, &mut ex2, storage).unwrap();
        assert_eq!(fresh.attr(text2, "value"), Some("compact"));
        assert!(fresh.has_attr(check2, "checked"));
    }

    #[test]
    fn test_open_state_mirrors_to_hotzone() {
        let (mut doc, _, _) = page();
        let mut ex = Expandables::new();
        let panel = SettingsPanel::mount(&mut doc, &mut ex, Storage::in_memory()).unwrap();
        assert!(!panel.is_open(&doc));
        panel.toggle(&mut doc, &mut ex);
        let hot = doc.element_by_id("settingsHotzone").unwrap();
        assert_eq!(doc.attr(hot, "aria-expanded"), Some("true"));
        assert!(panel.owns(&doc, hot));
    }

    #[test]
    fn test_tooltip_cooldown_rearms() {
        let mut doc = Document::new();
        let body = doc.body();
        let host = doc.create_element_with_class("label", "data-tooltip");
        let input = doc.create_element("input");
        doc.append_child(host, input);
        doc.append_child(body, host);

        let mut cd = TooltipCooldown::default();
        cd.activate(&mut doc, body, input, Duration::from_millis(0));
        assert!(doc.has_attr(host, "data-tip-suspend"));
        cd.activate(&mut doc, body, input, Duration::from_millis(1000));
        cd.tick(&mut doc, Duration::from_millis(2400));
        assert!(doc.has_attr(host, "data-tip-suspend"));
        cd.tick(&mut doc, Duration::from_millis(3400));
        assert!(!doc.has_attr(host, "data-tip-suspend"));
        assert_eq!(cd.next_deadline(), None);
    }
}
