//! Hover-intent menus.
//!
//! Two engines share the same protocol:
//!
//! - [`HoverMenus`] drives the top-level menu triggers (`.iconDiv[data-hasmenu]`),
//!   at most one of which is expanded at a time.
//! - [`Flyouts`] drives nested `.has-submenu` items inside the menus, where a
//!   flyout may stay open together with its ancestors and descendants.
//!
//! Both write their state into the document (`aria-expanded`, the `open`
//! class) and keep pending open/close timers on the host clock.

mod flyout;
mod trigger;

pub use flyout::Flyouts;
pub use trigger::HoverMenus;

use std::time::Duration;

use crate::constants::{DEFAULT_CLOSE_DELAY, DEFAULT_OPEN_DELAY};
use crate::dom::{Document, NodeId};

/// Observable state of a trigger or flyout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    /// Closed with nothing scheduled.
    Collapsed,
    /// Closed, open timer running.
    PendingOpen,
    /// Expanded.
    Open,
    /// Expanded, close timer running.
    PendingClose,
}

impl MenuState {
    pub(crate) const fn from_parts(expanded: bool, open_pending: bool, close_pending: bool) -> Self {
        match (expanded, open_pending, close_pending) {
            (true, _, true) => Self::PendingClose,
            (true, _, false) => Self::Open,
            (false, true, _) => Self::PendingOpen,
            (false, false, _) => Self::Collapsed,
        }
    }

    /// True for `Open` and `PendingClose`.
    #[must_use]
    pub const fn is_expanded(self) -> bool {
        matches!(self, Self::Open | Self::PendingClose)
    }
}

/// Keys the menus react to.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Enter,
    Space,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    Escape,
    Tab,
    Other,
}

impl NavKey {
    /// Maps a DOM `KeyboardEvent.key` name.
    #[must_use]
    pub fn from_key_name(name: &str) -> Self {
        match name {
            "Enter" => Self::Enter,
            " " | "Space" | "Spacebar" => Self::Space,
            "ArrowUp" | "Up" => Self::ArrowUp,
            "ArrowDown" | "Down" => Self::ArrowDown,
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowRight" | "Right" => Self::ArrowRight,
            "Home" => Self::Home,
            "End" => Self::End,
            "Escape" | "Esc" => Self::Escape,
            "Tab" => Self::Tab,
            _ => Self::Other,
        }
    }
}

/// Modifier keys held during a key press or click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    /// True when Ctrl, Alt or Meta is held.
    #[must_use]
    pub const fn any_command(self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// What an engine did with a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResult {
    /// Not for this engine; let the next handler see it.
    Ignored,
    /// Consumed, focus unchanged.
    Handled,
    /// Consumed; the host should move focus to the node.
    Focus(NodeId),
}

impl KeyResult {
    /// True unless `Ignored`.
    #[must_use]
    pub const fn is_handled(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Open and close delays for one trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverDelays {
    /// Delay between pointer-enter and expansion.
    pub open: Duration,
    /// Delay between pointer-leave and collapse.
    pub close: Duration,
}

impl Default for HoverDelays {
    fn default() -> Self {
        Self {
            open: DEFAULT_OPEN_DELAY,
            close: DEFAULT_CLOSE_DELAY,
        }
    }
}

impl HoverDelays {
    /// Delays for a top-level trigger: `data-open-delay` / `data-close-delay`
    /// override the defaults only when they are positive numbers.
    #[must_use]
    pub fn for_trigger(doc: &Document, node: NodeId, defaults: Self) -> Self {
        Self {
            open: parse_trigger_delay(doc.attr(node, "data-open-delay"), defaults.open),
            close: parse_trigger_delay(doc.attr(node, "data-close-delay"), defaults.close),
        }
    }

    /// Delays for a nested flyout: any finite non-negative override wins.
    #[must_use]
    pub fn for_flyout(doc: &Document, node: NodeId, defaults: Self) -> Self {
        Self {
            open: parse_flyout_delay(doc.attr(node, "data-open-delay"), defaults.open),
            close: parse_flyout_delay(doc.attr(node, "data-close-delay"), defaults.close),
        }
    }
}

fn parse_millis(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(0.0);
    }
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// `None` when `n` does not fit in a `Duration`.
fn millis(n: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(n / 1000.0).ok()
}

/// Positive overrides only; zero, negatives, junk and overflow fall back.
#[must_use]
pub fn parse_trigger_delay(raw: Option<&str>, fallback: Duration) -> Duration {
    raw.and_then(parse_millis)
        .filter(|n| *n > 0.0)
        .and_then(millis)
        .unwrap_or(fallback)
}

/// Finite non-negative overrides, zero included.
#[must_use]
pub fn parse_flyout_delay(raw: Option<&str>, fallback: Duration) -> Duration {
    raw.and_then(parse_millis)
        .filter(|n| *n >= 0.0)
        .and_then(millis)
        .unwrap_or(fallback)
}

/// How a pointer or focus move relates to one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Crossing {
    Enter,
    Leave,
    Inside,
    Outside,
}

impl Crossing {
    pub(crate) fn of(doc: &Document, element: NodeId, from: Option<NodeId>, to: Option<NodeId>) -> Self {
        let was = from.is_some_and(|n| doc.contains(element, n));
        let is = to.is_some_and(|n| doc.contains(element, n));
        match (was, is) {
            (false, true) => Self::Enter,
            (true, false) => Self::Leave,
            (true, true) => Self::Inside,
            (false, false) => Self::Outside,
        }
    }
}

pub(crate) fn is_disabled(doc: &Document, node: NodeId) -> bool {
    doc.has_attr(node, "hidden") || doc.attr(node, "aria-disabled") == Some("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_delay_rejects_zero_and_junk() {
        let d = Duration::from_millis(140);
        assert_eq!(parse_trigger_delay(None, d), d);
        assert_eq!(parse_trigger_delay(Some("0"), d), d);
        assert_eq!(parse_trigger_delay(Some("abc"), d), d);
        assert_eq!(parse_trigger_delay(Some("-5"), d), d);
        assert_eq!(parse_trigger_delay(Some("60"), d), Duration::from_millis(60));
    }

    #[test]
    fn test_flyout_delay_accepts_zero() {
        let d = Duration::from_millis(270);
        assert_eq!(parse_flyout_delay(Some("0"), d), Duration::ZERO);
        assert_eq!(parse_flyout_delay(Some(""), d), Duration::ZERO);
        assert_eq!(parse_flyout_delay(Some("NaN"), d), d);
        assert_eq!(parse_flyout_delay(Some("-1"), d), d);
        assert_eq!(parse_flyout_delay(Some("12.5"), d), Duration::from_micros(12_500));
    }

    #[test]
    fn test_oversized_delay_falls_back() {
        let d = Duration::from_millis(140);
        assert_eq!(parse_trigger_delay(Some("1e300"), d), d);
        assert_eq!(parse_flyout_delay(Some("1e300"), d), d);
        assert_eq!(parse_trigger_delay(Some("1e3"), d), Duration::from_secs(1));
    }

    #[test]
    fn test_state_from_parts() {
        assert_eq!(MenuState::from_parts(false, false, false), MenuState::Collapsed);
        assert_eq!(MenuState::from_parts(false, true, false), MenuState::PendingOpen);
        assert_eq!(MenuState::from_parts(true, false, false), MenuState::Open);
        assert_eq!(MenuState::from_parts(true, false, true), MenuState::PendingClose);
    }
}
