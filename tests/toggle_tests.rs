//! Settings switches: persistence, first-run defaults and menubar effects.

use navux::constants::SWITCHES_STORAGE_KEY;
use navux::hover::Modifiers;
use navux::menu::Catalog;
use navux::settings::{default_items, menu_trigger, ToggleBus, MENU_SWITCHES};
use navux::{FileStore, NavShell, ShellOptions, Storage};
use serde_json::Value;
use tempfile::TempDir;

fn shell_on(storage: Storage) -> NavShell {
    NavShell::with_skeleton(
        storage,
        Catalog::builtin().unwrap(),
        &["hb1", "hb2"],
        ShellOptions::default(),
    )
}

fn file_storage(dir: &TempDir) -> Storage {
    Storage::new(FileStore::open(dir.path().join("store.json")).unwrap())
}

#[test]
fn test_first_run_enables_menu_switches_once() {
    let storage = Storage::in_memory();
    let bus = ToggleBus::load(storage.clone(), default_items());
    assert!(bus.was_first_run());
    for (key, _) in MENU_SWITCHES {
        assert_eq!(bus.get(key), Some(true), "{key} should start on");
    }
    assert!(storage.contains(SWITCHES_STORAGE_KEY));

    let mut bus = ToggleBus::load(storage.clone(), default_items());
    assert!(!bus.was_first_run());
    bus.user_flip("s4", false);

    // A later load must not turn it back on.
    let bus = ToggleBus::load(storage, default_items());
    assert_eq!(bus.get("s4"), Some(false));
}

#[test]
fn test_disabling_shipping_hides_its_trigger() {
    let mut shell = shell_on(Storage::in_memory());
    let shipping = menu_trigger(shell.document(), "shipping").unwrap();
    shell.click(shipping, Modifiers::default());
    assert_eq!(shell.document().attr(shipping, "aria-expanded"), Some("true"));

    shell.set_toggle("s5", false).unwrap();

    let doc = shell.document();
    assert!(doc.has_attr(shipping, "hidden"));
    assert_eq!(doc.attr(shipping, "aria-hidden"), Some("true"));
    assert_eq!(doc.attr(shipping, "tabindex"), Some("-1"));
    assert_eq!(doc.attr(shipping, "aria-expanded"), Some("false"));

    shell.set_toggle("s5", true).unwrap();
    let doc = shell.document();
    assert!(!doc.has_attr(shipping, "hidden"));
    assert_ne!(doc.attr(shipping, "aria-hidden"), Some("true"));
}

#[test]
fn test_unknown_switch_is_ignored() {
    let mut shell = shell_on(Storage::in_memory());
    assert!(shell.set_toggle("s99", true).is_none());
    assert_eq!(shell.toggles().get("s99"), None);
}

#[test]
fn test_switches_survive_reload() {
    let dir = TempDir::new().unwrap();

    {
        let mut shell = shell_on(file_storage(&dir));
        shell.set_toggle("s5", false).unwrap();
        shell.set_toggle("s1", true).unwrap();
    }

    let raw = std::fs::read_to_string(dir.path().join("store.json")).unwrap();
    let outer: Value = serde_json::from_str(&raw).unwrap();
    let blob: Value = serde_json::from_str(outer[SWITCHES_STORAGE_KEY].as_str().unwrap()).unwrap();
    assert_eq!(blob["s5"], Value::Bool(false));
    assert_eq!(blob["s1"], Value::Bool(true));

    let shell = shell_on(file_storage(&dir));
    assert!(!shell.toggles().was_first_run());
    assert_eq!(shell.toggles().get("s5"), Some(false));
    assert_eq!(shell.toggles().get("s1"), Some(true));
    let shipping = menu_trigger(shell.document(), "shipping").unwrap();
    assert!(shell.document().has_attr(shipping, "hidden"));
}

#[test]
fn test_other_session_writes_apply_with_live_sync() {
    let storage = Storage::in_memory();
    let mut shell = NavShell::with_skeleton(
        storage.clone(),
        Catalog::builtin().unwrap(),
        &[],
        ShellOptions {
            live_sync: true,
            ..ShellOptions::default()
        },
    );

    storage.set_raw(SWITCHES_STORAGE_KEY, r#"{"s4": false, "s5": true, "s6": true, "s7": true}"#);
    assert!(shell.sync_external() > 0);
    assert_eq!(shell.toggles().get("s4"), Some(false));
    let accounts = menu_trigger(shell.document(), "accounts").unwrap();
    assert!(shell.document().has_attr(accounts, "hidden"));
}
