//! Hover-intent timing and trigger exclusivity through the shell.

use std::time::Duration;

use navux::dom::NodeId;
use navux::hover::{Modifiers, NavKey};
use navux::menu::Catalog;
use navux::settings::menu_trigger;
use navux::{NavShell, ShellOptions, Storage};

fn shell() -> NavShell {
    NavShell::with_skeleton(
        Storage::in_memory(),
        Catalog::builtin().unwrap(),
        &["hb1"],
        ShellOptions::default(),
    )
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn triggers(shell: &NavShell) -> Vec<NodeId> {
    shell
        .catalog()
        .menus
        .iter()
        .filter_map(|m| menu_trigger(shell.document(), &m.key))
        .collect()
}

fn expanded(shell: &NavShell, node: NodeId) -> bool {
    shell.document().attr(node, "aria-expanded") == Some("true")
}

fn open_count(shell: &NavShell) -> usize {
    triggers(shell).into_iter().filter(|&t| expanded(shell, t)).count()
}

#[test]
fn test_short_hover_never_opens() {
    let mut shell = shell();
    let shipping = menu_trigger(shell.document(), "shipping").unwrap();

    shell.pointer_move(Some(shipping));
    shell.advance(ms(100));
    shell.pointer_move(None);
    for t in (100..=1000).step_by(20) {
        shell.advance(ms(t));
        assert!(!expanded(&shell, shipping), "opened at {t} ms");
    }
}

#[test]
fn test_hover_then_leave_closes_after_delay() {
    let mut shell = shell();
    let shipping = menu_trigger(shell.document(), "shipping").unwrap();

    shell.pointer_move(Some(shipping));
    shell.advance(ms(140));
    assert!(expanded(&shell, shipping));

    shell.pointer_move(None);
    shell.advance(ms(300));
    assert!(expanded(&shell, shipping), "closed before the close delay");
    shell.advance(ms(420));
    assert!(!expanded(&shell, shipping));
}

#[test]
fn test_at_most_one_trigger_open() {
    let mut shell = shell();
    let all = triggers(&shell);
    assert!(all.len() >= 2);

    let mut now = 0;
    for (round, &target) in all.iter().cycle().take(12).enumerate() {
        if round % 3 == 0 {
            shell.click(target, Modifiers::default());
        } else {
            shell.pointer_move(Some(target));
        }
        for _ in 0..4 {
            now += 60;
            shell.advance(ms(now));
            assert!(open_count(&shell) <= 1, "two menus open at {now} ms");
        }
    }
}

#[test]
fn test_keyboard_escape_collapses() {
    let mut shell = shell();
    let processing = menu_trigger(shell.document(), "processing").unwrap();
    shell.focus(Some(processing));
    shell.key(NavKey::Enter, Modifiers::default());
    assert!(expanded(&shell, processing));

    shell.key(NavKey::Escape, Modifiers::default());
    assert!(!expanded(&shell, processing));
    assert_eq!(open_count(&shell), 0);
}

#[test]
fn test_outside_pointer_down_closes_everything() {
    let mut shell = shell();
    let shipping = menu_trigger(shell.document(), "shipping").unwrap();
    shell.click(shipping, Modifiers::default());
    assert!(expanded(&shell, shipping));

    shell.pointer_down(None);
    assert_eq!(open_count(&shell), 0);
}
