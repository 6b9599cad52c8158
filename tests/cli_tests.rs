//! End-to-end tests for the `navux` subcommands.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

/// Path to the navux binary
fn navux_bin() -> &'static str {
    env!("CARGO_BIN_EXE_navux")
}

/// Runs a command with an isolated config directory.
fn run(args: &[&str], config_dir: &Path) -> Output {
    Command::new(navux_bin())
        .env("NAVUX_CONFIG_DIR", config_dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn assert_success(output: &Output) {
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

// ============================================================================
// Menus
// ============================================================================

#[test]
fn test_render_menu() {
    let dir = TempDir::new().unwrap();
    let output = run(&["render", "processing"], dir.path());
    assert_success(&output);
    assert!(stdout(&output).contains("PO Pending"));
}

#[test]
fn test_render_unknown_menu_fails_validation() {
    let dir = TempDir::new().unwrap();
    let output = run(&["render", "warp-drive"], dir.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown menu"));
}

#[test]
fn test_check_menus_builtin_is_clean() {
    let dir = TempDir::new().unwrap();
    let output = run(&["check-menus", "--json"], dir.path());
    assert_success(&output);
    let json: Value = serde_json::from_str(&stdout(&output)).expect("Should parse JSON output");
    assert_eq!(json["valid"], true);
    assert_eq!(json["menus"], 4);
}

#[test]
fn test_check_menus_reports_dangling_keys() {
    let dir = TempDir::new().unwrap();
    let catalog = dir.path().join("menus.json");
    std::fs::write(
        &catalog,
        r#"{"icons": {}, "hrefs": {}, "menus": [{"key": "x", "label": "X", "items": [{"label": "Gone", "iconKey": "ghost", "hrefKey": "a.b"}]}]}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        format!("[menus]\ncatalog = {:?}\n", catalog.display().to_string()),
    )
    .unwrap();

    let output = run(&["check-menus"], dir.path());
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("ghost"));
    assert!(out.contains("a.b"));
}

// ============================================================================
// Switches
// ============================================================================

#[test]
fn test_toggle_set_persists_between_runs() {
    let dir = TempDir::new().unwrap();

    let output = run(&["toggles", "get", "s5"], dir.path());
    assert_success(&output);
    assert_eq!(stdout(&output).trim(), "on");

    assert_success(&run(&["toggles", "set", "s5", "off"], dir.path()));

    let output = run(&["toggles", "get", "s5"], dir.path());
    assert_eq!(stdout(&output).trim(), "off");
    assert!(dir.path().join("store.json").exists());

    let output = run(&["toggles", "list", "--json"], dir.path());
    let rows: Value = serde_json::from_str(&stdout(&output)).unwrap();
    let s5 = rows.as_array().unwrap().iter().find(|r| r["key"] == "s5").unwrap().clone();
    assert_eq!(s5["value"], false);
}

#[test]
fn test_toggle_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    let output = run(&["toggles", "set", "s99", "on"], dir.path());
    assert_eq!(output.status.code(), Some(1));

    // clap reports its own usage errors with code 2
    let output = run(&["toggles", "set", "s5", "sideways"], dir.path());
    assert_ne!(output.status.code(), Some(0));
}

// ============================================================================
// Hotbuttons
// ============================================================================

#[test]
fn test_hotbutton_set_show_clear() {
    let dir = TempDir::new().unwrap();
    let output = run(
        &[
            "hotbutton",
            "set",
            "hb1",
            "--svg",
            "<svg><script>alert(1)</script><path d=\"M0 0h4\"/></svg>",
            "--href",
            "?p=reports",
            "--label",
            "Reports",
        ],
        dir.path(),
    );
    assert_success(&output);

    let output = run(&["hotbutton", "show", "hb1", "--json"], dir.path());
    assert_success(&output);
    let json: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["label"], "Reports");
    assert!(!json["svg"].as_str().unwrap().contains("script"));

    assert_success(&run(&["hotbutton", "clear", "hb1"], dir.path()));
    let output = run(&["hotbutton", "show", "hb1", "--json"], dir.path());
    assert_eq!(stdout(&output).trim(), "null");
}

#[test]
fn test_hotbutton_invalid_svg() {
    let dir = TempDir::new().unwrap();
    let output = run(&["hotbutton", "set", "hb2", "--svg", "<div/>"], dir.path());
    assert_eq!(output.status.code(), Some(1));

    let output = run(&["hotbutton", "show", "hb9"], dir.path());
    assert_eq!(output.status.code(), Some(1));
}
