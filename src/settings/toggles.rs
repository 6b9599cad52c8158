//! Persisted boolean switches with a publish/subscribe bus.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bus::{EventBus, SubscriptionId};
use crate::constants::SWITCHES_STORAGE_KEY;
use crate::storage::Storage;

/// Switches that control menubar tab visibility, by menu key.
pub const MENU_SWITCHES: [(&str, &str); 4] = [
    ("s4", "accounts"),
    ("s5", "shipping"),
    ("s6", "production"),
    ("s7", "processing"),
];

/// Switch whose value drives `data-ambient` on the document root.
pub const AMBIENT_SWITCH: &str = "s3";

/// Static description of one switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleItem {
    /// Storage and lookup key (`s1`..`s7`).
    pub key: String,
    /// Short machine name, also the form field name.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Value used when nothing is persisted.
    pub value: bool,
    /// Tooltip shown on the switch.
    pub tooltip: String,
    /// Icon shown while on; the built-in glyph is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_svg: Option<String>,
    /// Icon shown while off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off_svg: Option<String>,
}

impl ToggleItem {
    fn new(key: &str, name: &str, label: &str, value: bool, tooltip: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            label: label.to_string(),
            value,
            tooltip: tooltip.to_string(),
            on_svg: None,
            off_svg: None,
        }
    }
}

/// The built-in switch set.
#[must_use]
pub fn default_items() -> Vec<ToggleItem> {
    vec![
        ToggleItem::new("s1", "claim", "Claim Buttons", false, "Claim Mode"),
        ToggleItem::new("s2", "copy", "Copy Buttons", false, "Copy Buttons"),
        ToggleItem::new("s3", "ambient", "Ambient Mode", false, "Ambient Mode"),
        ToggleItem::new("s4", "acct", "Customer Account", true, "Customer Account Tab"),
        ToggleItem::new("s5", "ship", "Shipping", true, "Shipping Tab"),
        ToggleItem::new("s6", "product", "Production", true, "Production Tab"),
        ToggleItem::new("s7", "process", "Processing", true, "Processing Tab"),
    ]
}

/// Payload delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleChange {
    /// Switch key.
    pub key: String,
    /// Switch name.
    pub name: String,
    /// Switch label.
    pub label: String,
    /// New value.
    pub value: bool,
}

/// One row of [`ToggleBus::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleEntry {
    /// Switch key.
    pub key: String,
    /// Switch name.
    pub name: String,
    /// Switch label.
    pub label: String,
    /// Current value.
    pub value: bool,
}

/// Options for [`ToggleBus::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOptions {
    /// Persist the state blob when the value changed.
    pub save: bool,
    /// Publish a [`ToggleChange`].
    pub emit: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            save: true,
            emit: true,
        }
    }
}

impl SetOptions {
    /// Apply without writing back; used for state written elsewhere.
    pub const REMOTE: Self = Self {
        save: false,
        emit: true,
    };
}

/// The switch state machine.
pub struct ToggleBus {
    items: Vec<ToggleItem>,
    state: BTreeMap<String, bool>,
    storage: Storage,
    bus: EventBus<ToggleChange>,
    first_run: bool,
}

impl std::fmt::Debug for ToggleBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToggleBus")
            .field("state", &self.state)
            .field("first_run", &self.first_run)
            .finish_non_exhaustive()
    }
}

impl ToggleBus {
    /// Loads state from storage on top of the item defaults.
    ///
    /// When no blob is persisted at all, the menu switches are turned on and
    /// the blob is written once.
    pub fn load(storage: Storage, items: Vec<ToggleItem>) -> Self {
        let mut state: BTreeMap<String, bool> =
            items.iter().map(|i| (i.key.clone(), i.value)).collect();

        let first_run = storage
            .get_raw(SWITCHES_STORAGE_KEY)
            .map_or(true, |raw| raw.is_empty());
        if let Some(saved) = storage.read_json::<BTreeMap<String, serde_json::Value>>(SWITCHES_STORAGE_KEY) {
            for (key, value) in saved {
                if let Some(slot) = state.get_mut(&key) {
                    *slot = truthy(&value);
                }
            }
        }

        let mut bus = Self {
            items,
            state,
            storage,
            bus: EventBus::new(),
            first_run,
        };

        if first_run {
            info!("no saved switches, enabling menu tabs");
            for (key, _) in MENU_SWITCHES {
                if let Some(slot) = bus.state.get_mut(key) {
                    *slot = true;
                }
            }
            bus.save();
        }
        bus
    }

    /// Whether this load found nothing persisted.
    #[must_use]
    pub const fn was_first_run(&self) -> bool {
        self.first_run
    }

    /// Current value of a switch.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<bool> {
        self.state.get(key).copied()
    }

    /// Static description of a switch.
    #[must_use]
    pub fn item(&self, key: &str) -> Option<&ToggleItem> {
        self.items.iter().find(|i| i.key == key)
    }

    /// All switch descriptions in display order.
    #[must_use]
    pub fn items(&self) -> &[ToggleItem] {
        &self.items
    }

    /// Sets a switch. Unknown keys are ignored (returns `None`).
    ///
    /// Storage is written only with `opts.save` and an actual change; the
    /// change is published whenever `opts.emit` is set.
    pub fn set(&mut self, key: &str, value: bool, opts: SetOptions) -> Option<ToggleChange> {
        let item = self.item(key)?.clone();
        let prev = self.state.insert(key.to_string(), value).unwrap_or(item.value);
        if opts.save && prev != value {
            self.save();
        }
        let change = ToggleChange {
            key: item.key,
            name: item.name,
            label: item.label,
            value,
        };
        if opts.emit {
            self.bus.publish(key, &change);
        }
        debug!(key, value, "switch set");
        Some(change)
    }

    /// A user flipped the switch: always persists and publishes.
    pub fn user_flip(&mut self, key: &str, value: bool) -> Option<ToggleChange> {
        let item = self.item(key)?.clone();
        self.state.insert(key.to_string(), value);
        self.save();
        let change = ToggleChange {
            key: item.key,
            name: item.name,
            label: item.label,
            value,
        };
        self.bus.publish(key, &change);
        Some(change)
    }

    /// Applies a blob written by another session without writing it back.
    /// Returns how many known keys were applied.
    pub fn apply_external(&mut self, raw: &str) -> usize {
        let saved: BTreeMap<String, serde_json::Value> = serde_json::from_str(raw).unwrap_or_default();
        let keys: Vec<String> = self.items.iter().map(|i| i.key.clone()).collect();
        let mut applied = 0;
        for key in keys {
            if let Some(value) = saved.get(&key) {
                self.set(&key, truthy(value), SetOptions::REMOTE);
                applied += 1;
            }
        }
        applied
    }

    /// Subscribes to one switch.
    pub fn subscribe<F>(&mut self, key: &str, handler: F) -> SubscriptionId
    where
        F: FnMut(&ToggleChange) + Send + 'static,
    {
        self.bus.subscribe(key, handler)
    }

    /// Subscribes to every switch.
    pub fn subscribe_all<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&ToggleChange) + Send + 'static,
    {
        self.bus.subscribe_all(handler)
    }

    /// Removes a subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Snapshot of every switch.
    #[must_use]
    pub fn list(&self) -> Vec<ToggleEntry> {
        self.items
            .iter()
            .map(|i| ToggleEntry {
                key: i.key.clone(),
                name: i.name.clone(),
                label: i.label.clone(),
                value: self.get(&i.key).unwrap_or(i.value),
            })
            .collect()
    }

    fn save(&self) {
        self.storage.write_json(SWITCHES_STORAGE_KEY, &self.state);
    }
}

/// JavaScript-style truthiness for persisted values.
fn truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn saved(storage: &Storage) -> BTreeMap<String, bool> {
        storage.read_json(SWITCHES_STORAGE_KEY).unwrap()
    }

    #[test]
    fn test_first_run_enables_menus_and_saves() {
        let storage = Storage::in_memory();
        let bus = ToggleBus::load(storage.clone(), default_items());
        assert!(bus.was_first_run());
        let blob = saved(&storage);
        for (key, _) in MENU_SWITCHES {
            assert_eq!(blob.get(key), Some(&true));
        }
        assert_eq!(blob.get("s1"), Some(&false));

        let again = ToggleBus::load(storage, default_items());
        assert!(!again.was_first_run());
    }

    #[test]
    fn test_empty_blob_counts_as_first_run() {
        let storage = Storage::in_memory();
        storage.set_raw(SWITCHES_STORAGE_KEY, "");
        let bus = ToggleBus::load(storage.clone(), default_items());
        assert!(bus.was_first_run());
        assert_eq!(saved(&storage).get("s5"), Some(&true));
    }

    #[test]
    fn test_saved_values_override_defaults() {
        let storage = Storage::in_memory();
        storage.set_raw(SWITCHES_STORAGE_KEY, r#"{"s1": true, "s5": false, "bogus": true}"#);
        let bus = ToggleBus::load(storage, default_items());
        assert_eq!(bus.get("s1"), Some(true));
        assert_eq!(bus.get("s5"), Some(false));
        assert_eq!(bus.get("bogus"), None);
    }

    #[test]
    fn test_corrupt_blob_is_treated_as_defaults() {
        let storage = Storage::in_memory();
        storage.set_raw(SWITCHES_STORAGE_KEY, "{not json");
        let bus = ToggleBus::load(storage, default_items());
        assert!(!bus.was_first_run());
        assert_eq!(bus.get("s4"), Some(true));
        assert_eq!(bus.get("s2"), Some(false));
    }

    #[test]
    fn test_set_unknown_key_is_noop() {
        let mut bus = ToggleBus::load(Storage::in_memory(), default_items());
        assert!(bus.set("s99", true, SetOptions::default()).is_none());
    }

    #[test]
    fn test_set_saves_only_on_change() {
        let storage = Storage::in_memory();
        let mut bus = ToggleBus::load(storage.clone(), default_items());
        storage.remove(SWITCHES_STORAGE_KEY);

        bus.set("s4", true, SetOptions::default());
        assert!(!storage.contains(SWITCHES_STORAGE_KEY));

        bus.set("s4", false, SetOptions::REMOTE);
        assert!(!storage.contains(SWITCHES_STORAGE_KEY));

        bus.set("s4", true, SetOptions::default());
        assert_eq!(saved(&storage).get("s4"), Some(&true));
    }

    #[test]
    fn test_emit_even_without_change() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = ToggleBus::load(Storage::in_memory(), default_items());
        let s = Arc::clone(&seen);
        bus.subscribe("s5", move |c| s.lock().unwrap().push(c.value));

        bus.set("s5", true, SetOptions::default());
        bus.set("s5", false, SetOptions { save: true, emit: false });
        bus.set("s6", false, SetOptions::default());

        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }

    #[test]
    fn test_apply_external_does_not_write_back() {
        let storage = Storage::in_memory();
        let mut bus = ToggleBus::load(storage.clone(), default_items());
        let before = storage.get_raw(SWITCHES_STORAGE_KEY);

        let seen = Arc::new(Mutex::new(0));
        let s = Arc::clone(&seen);
        bus.subscribe_all(move |_| *s.lock().unwrap() += 1);

        assert_eq!(bus.apply_external(r#"{"s1": 1, "s7": false}"#), 2);
        assert_eq!(bus.get("s1"), Some(true));
        assert_eq!(bus.get("s7"), Some(false));
        assert_eq!(*seen.lock().unwrap(), 2);
        assert_eq!(storage.get_raw(SWITCHES_STORAGE_KEY), before);
    }

    #[test]
    fn test_list_reports_current_values() {
        let mut bus = ToggleBus::load(Storage::in_memory(), default_items());
        bus.user_flip("s2", true);
        let list = bus.list();
        assert_eq!(list.len(), 7);
        assert!(list.iter().any(|e| e.key == "s2" && e.value));
    }
}
