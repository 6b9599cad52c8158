//! Nested `.has-submenu` flyouts.

use std::time::Duration;

use tracing::trace;

use super::{Crossing, HoverDelays, KeyResult, MenuState, NavKey};
use crate::dom::{Document, NodeId};
use crate::timer::{earliest, Timer};

#[derive(Debug, Clone)]
struct Flyout {
    node: NodeId,
    delays: HoverDelays,
    open_timer: Timer,
    close_timer: Timer,
}

/// Engine for nested flyouts.
///
/// Opening a flyout closes every flyout outside its family (itself, its
/// ancestors and its descendants).
#[derive(Debug, Clone, Default)]
pub struct Flyouts {
    defaults: HoverDelays,
    items: Vec<Flyout>,
}

impl Flyouts {
    /// Creates an empty engine.
    #[must_use]
    pub fn new(defaults: HoverDelays) -> Self {
        Self {
            defaults,
            items: Vec::new(),
        }
    }

    /// Registers every attached `.has-submenu` element.
    pub fn mount(doc: &Document, defaults: HoverDelays) -> Self {
        let mut engine = Self::new(defaults);
        engine.sync(doc);
        engine
    }

    /// Drops flyouts that left the document and registers new ones.
    pub fn sync(&mut self, doc: &Document) {
        self.items.retain(|f| doc.is_attached(f.node));
        for node in doc.elements_by_class("has-submenu") {
            self.register(doc, node);
        }
    }

    /// Registers one flyout; returns its index.
    pub fn register(&mut self, doc: &Document, node: NodeId) -> usize {
        if let Some(index) = self.index_of(node) {
            return index;
        }
        self.items.push(Flyout {
            node,
            delays: HoverDelays::for_flyout(doc, node, self.defaults),
            open_timer: Timer::default(),
            close_timer: Timer::default(),
        });
        self.items.len() - 1
    }

    /// Number of registered flyouts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the flyout element `node`.
    #[must_use]
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.items.iter().position(|f| f.node == node)
    }

    /// Innermost flyout containing `node`.
    #[must_use]
    pub fn innermost_containing(&self, doc: &Document, node: NodeId) -> Option<usize> {
        let flyout = doc.closest(node, |d, n| d.has_class(n, "has-submenu"))?;
        self.index_of(flyout)
    }

    /// Element of the flyout at `index`.
    #[must_use]
    pub fn node(&self, index: usize) -> Option<NodeId> {
        self.items.get(index).map(|f| f.node)
    }

    /// Whether the flyout carries the `open` class.
    #[must_use]
    pub fn is_open(&self, doc: &Document, index: usize) -> bool {
        self.items
            .get(index)
            .is_some_and(|f| doc.has_class(f.node, "open"))
    }

    /// Current state of the flyout at `index`.
    #[must_use]
    pub fn state(&self, doc: &Document, index: usize) -> MenuState {
        let Some(f) = self.items.get(index) else {
            return MenuState::Collapsed;
        };
        MenuState::from_parts(
            self.is_open(doc, index),
            f.open_timer.is_armed(),
            f.close_timer.is_armed(),
        )
    }

    fn apply(&self, doc: &mut Document, index: usize, on: bool) {
        let node = self.items[index].node;
        trace!(index, on, "flyout expanded");
        doc.toggle_class(node, "open", on);
        doc.set_attr(node, "aria-expanded", if on { "true" } else { "false" });
    }

    /// Opens a flyout after its open delay, or now when `immediate`.
    pub fn open(&mut self, doc: &mut Document, index: usize, immediate: bool, now: Duration) {
        if index >= self.items.len() {
            return;
        }
        self.items[index].close_timer.clear();
        if self.is_open(doc, index) {
            return;
        }
        if immediate {
            self.items[index].open_timer.clear();
            self.apply(doc, index, true);
        } else {
            let f = &mut self.items[index];
            f.open_timer.arm(now, f.delays.open);
        }
    }

    /// Closes a flyout after its close delay, or now when `immediate`.
    pub fn close(&mut self, doc: &mut Document, index: usize, immediate: bool, now: Duration) {
        if index >= self.items.len() {
            return;
        }
        self.items[index].open_timer.clear();
        if immediate {
            self.items[index].close_timer.clear();
            self.apply(doc, index, false);
        } else {
            let f = &mut self.items[index];
            f.close_timer.arm(now, f.delays.close);
        }
    }

    /// Closes, immediately, every flyout outside the family of `except`.
    pub fn close_all_except_family(&mut self, doc: &mut Document, except: Option<usize>) {
        let keep = except.and_then(|i| self.node(i));
        for i in 0..self.items.len() {
            let node = self.items[i].node;
            let related = keep.is_some_and(|k| doc.contains(node, k) || doc.contains(k, node));
            if !related {
                self.close(doc, i, true, Duration::ZERO);
            }
        }
    }

    /// Closes every flyout immediately.
    pub fn close_all(&mut self, doc: &mut Document) {
        self.close_all_except_family(doc, None);
    }

    /// Feeds a pointer move.
    pub fn pointer_move(
        &mut self,
        doc: &mut Document,
        from: Option<NodeId>,
        to: Option<NodeId>,
        now: Duration,
    ) {
        let mut entered = Vec::new();
        for i in 0..self.items.len() {
            match Crossing::of(doc, self.items[i].node, from, to) {
                Crossing::Leave => self.close(doc, i, false, now),
                Crossing::Enter => entered.push(i),
                Crossing::Inside | Crossing::Outside => {}
            }
        }
        for i in entered {
            self.close_all_except_family(doc, Some(i));
            self.open(doc, i, false, now);
        }
    }

    /// Feeds a focus move.
    pub fn focus_change(
        &mut self,
        doc: &mut Document,
        from: Option<NodeId>,
        to: Option<NodeId>,
        now: Duration,
    ) {
        self.pointer_move(doc, from, to, now);
    }

    /// Handles a click. A click on a closed flyout opens it immediately and
    /// is consumed (returns true).
    pub fn click(&mut self, doc: &mut Document, target: NodeId, now: Duration) -> bool {
        let Some(index) = self.innermost_containing(doc, target) else {
            return false;
        };
        if self.is_open(doc, index) {
            return false;
        }
        self.close_all_except_family(doc, Some(index));
        self.open(doc, index, true, now);
        true
    }

    fn sublist(doc: &Document, node: NodeId) -> Option<NodeId> {
        doc.query(node, |d, n| {
            d.has_class(n, "sublist") || d.has_class(n, "submenu") || d.attr(n, "role") == Some("menu")
        })
    }

    /// Focusable entries of a sublist, excluding deeper sublists.
    fn focusables(doc: &Document, sublist: NodeId) -> Vec<NodeId> {
        doc.query_all(sublist, |d, n| {
            let focusable = (d.tag(n) == Some("a") && d.has_attr(n, "href"))
                || (d.tag(n) == Some("button") && !d.has_attr(n, "disabled"))
                || d.attr(n, "role") == Some("menuitem")
                || d.attr(n, "tabindex").is_some_and(|t| t != "-1");
            let owner = d.parent(n).and_then(|p| {
                d.closest(p, |d, x| {
                    d.has_class(x, "sublist") || d.has_class(x, "submenu") || d.attr(x, "role") == Some("menu")
                })
            });
            focusable && owner == Some(sublist)
        })
    }

    /// Moves to the previous/next `.has-submenu` sibling, wrapping. Needs at
    /// least two siblings.
    pub fn move_horizontal(&mut self, doc: &mut Document, index: usize, forward: bool, now: Duration) -> Option<NodeId> {
        let node = self.node(index)?;
        let parent = doc.parent(node)?;
        let siblings: Vec<NodeId> = doc
            .element_children(parent)
            .into_iter()
            .filter(|&n| doc.has_class(n, "has-submenu"))
            .collect();
        let pos = siblings.iter().position(|&n| n == node)?;
        if siblings.len() < 2 {
            return None;
        }
        let n = siblings.len();
        let target = siblings[if forward { (pos + 1) % n } else { (pos + n - 1) % n }];
        let target_index = self.register(doc, target);
        self.close_all_except_family(doc, Some(target_index));
        self.open(doc, target_index, true, now);
        Some(target)
    }

    /// Handles a key press while `focused` has focus.
    ///
    /// On the flyout element itself: Escape closes, ArrowDown/ArrowUp open
    /// and focus the first/last sub-item, ArrowLeft/ArrowRight move between
    /// sibling flyouts. Inside an open sublist the same keys cycle sub-items.
    pub fn key_down(&mut self, doc: &mut Document, focused: NodeId, key: NavKey, now: Duration) -> KeyResult {
        let Some(index) = self.innermost_containing(doc, focused) else {
            return KeyResult::Ignored;
        };
        let node = self.items[index].node;
        let sublist = Self::sublist(doc, node);
        let entries = sublist.map(|s| Self::focusables(doc, s)).unwrap_or_default();
        let in_sublist = focused != node && sublist.is_some_and(|s| doc.contains(s, focused));

        match key {
            NavKey::Escape => {
                self.close(doc, index, true, now);
                KeyResult::Focus(node)
            }
            NavKey::ArrowDown | NavKey::ArrowUp if in_sublist => {
                let len = entries.len();
                let pos = entries.iter().position(|&n| n == focused).unwrap_or(0);
                let next = if key == NavKey::ArrowDown {
                    (pos + 1) % len.max(1)
                } else {
                    (pos + len.max(1) - 1) % len.max(1)
                };
                entries.get(next).copied().map_or(KeyResult::Handled, KeyResult::Focus)
            }
            NavKey::ArrowDown => {
                self.open(doc, index, true, now);
                KeyResult::Focus(entries.first().copied().unwrap_or(node))
            }
            NavKey::ArrowUp => {
                self.open(doc, index, true, now);
                KeyResult::Focus(entries.last().copied().unwrap_or(node))
            }
            NavKey::ArrowLeft | NavKey::ArrowRight => self
                .move_horizontal(doc, index, key == NavKey::ArrowRight, now)
                .map_or(KeyResult::Handled, KeyResult::Focus),
            _ => KeyResult::Ignored,
        }
    }

    /// A pointer-down outside every flyout closes them all.
    pub fn pointer_down(&mut self, doc: &mut Document, target: Option<NodeId>) {
        let inside = target.is_some_and(|t| doc.closest_class(t, "has-submenu").is_some());
        if !inside {
            self.close_all(doc);
        }
    }

    /// Window blur closes every flyout.
    pub fn blur(&mut self, doc: &mut Document) {
        self.close_all(doc);
    }

    /// Runs due timers in deadline order.
    pub fn tick(&mut self, doc: &mut Document, now: Duration) {
        loop {
            let due = self
                .items
                .iter()
                .enumerate()
                .flat_map(|(i, f)| {
                    [
                        f.open_timer.deadline().map(|d| (d, i, true)),
                        f.close_timer.deadline().map(|d| (d, i, false)),
                    ]
                })
                .flatten()
                .filter(|(d, _, _)| *d <= now)
                .min();
            let Some((_, index, open)) = due else {
                break;
            };
            if open {
                self.items[index].open_timer.clear();
            } else {
                self.items[index].close_timer.clear();
            }
            self.apply(doc, index, open);
        }
    }

    /// Earliest pending timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        earliest(
            self.items
                .iter()
                .flat_map(|f| [f.open_timer.deadline(), f.close_timer.deadline()]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Builds `ul > li.has-submenu x3`, the middle one with a nested flyout.
    fn fixture() -> (Document, Vec<NodeId>, NodeId, Vec<NodeId>) {
        let mut doc = Document::new();
        let body = doc.body();
        let list = doc.create_element_with_class("ul", "list");
        doc.append_child(body, list);
        let mut tops = Vec::new();
        let mut subs = Vec::new();
        for _ in 0..3 {
            let li = doc.create_element_with_class("li", "element has-submenu");
            let sub = doc.create_element_with_class("ul", "sublist");
            doc.set_attr(sub, "role", "menu");
            for _ in 0..2 {
                let s = doc.create_element_with_class("li", "subelement");
                doc.set_attr(s, "role", "menuitem");
                doc.append_child(sub, s);
                subs.push(s);
            }
            doc.append_child(li, sub);
            doc.append_child(list, li);
            tops.push(li);
        }
        let nested = doc.create_element_with_class("li", "subelement has-submenu");
        let nested_sub = doc.create_element_with_class("ul", "sublist");
        doc.append_child(nested, nested_sub);
        let tops1_sub = doc.children(tops[1])[0];
        doc.append_child(tops1_sub, nested);
        (doc, tops, nested, subs)
    }

    #[test]
    fn test_family_stays_open() {
        let (mut doc, tops, nested, _) = fixture();
        let mut fly = Flyouts::mount(&doc, HoverDelays::default());
        assert_eq!(fly.len(), 4);
        let (a, b, c) = (0, 1, fly.index_of(nested).unwrap());

        fly.open(&mut doc, a, true, ms(0));
        fly.open(&mut doc, b, true, ms(0));
        fly.close_all_except_family(&mut doc, Some(c));
        fly.open(&mut doc, c, true, ms(0));

        assert!(!fly.is_open(&doc, a));
        assert!(fly.is_open(&doc, b));
        assert!(fly.is_open(&doc, c));
        assert_eq!(doc.attr(tops[1], "aria-expanded"), Some("true"));
    }

    #[test]
    fn test_hover_open_and_leave() {
        let (mut doc, tops, _, _) = fixture();
        let mut fly = Flyouts::mount(&doc, HoverDelays::default());
        fly.pointer_move(&mut doc, None, Some(tops[0]), ms(0));
        assert_eq!(fly.state(&doc, 0), MenuState::PendingOpen);
        fly.tick(&mut doc, ms(140));
        assert_eq!(fly.state(&doc, 0), MenuState::Open);

        fly.pointer_move(&mut doc, Some(tops[0]), None, ms(200));
        assert_eq!(fly.state(&doc, 0), MenuState::PendingClose);
        fly.tick(&mut doc, ms(470));
        assert_eq!(fly.state(&doc, 0), MenuState::Collapsed);
    }

    #[test]
    fn test_zero_delay_override() {
        let (mut doc, tops, _, _) = fixture();
        doc.set_attr(tops[0], "data-open-delay", "0");
        let mut fly = Flyouts::mount(&doc, HoverDelays::default());
        fly.pointer_move(&mut doc, None, Some(tops[0]), ms(10));
        assert_eq!(fly.next_deadline(), Some(ms(10)));
    }

    #[test]
    fn test_click_opens_closed_flyout_once() {
        let (mut doc, tops, _, _) = fixture();
        let mut fly = Flyouts::mount(&doc, HoverDelays::default());
        let last = fly.index_of(tops[2]).unwrap();
        assert!(fly.click(&mut doc, tops[2], ms(0)));
        assert!(fly.is_open(&doc, last));
        assert!(!fly.click(&mut doc, tops[2], ms(0)));
    }

    #[test]
    fn test_horizontal_moves_wrap() {
        let (mut doc, tops, _, _) = fixture();
        let mut fly = Flyouts::mount(&doc, HoverDelays::default());
        fly.open(&mut doc, 0, true, ms(0));

        let r = fly.key_down(&mut doc, tops[0], NavKey::ArrowLeft, ms(0));
        assert_eq!(r, KeyResult::Focus(tops[2]));
        assert!(fly.is_open(&doc, fly.index_of(tops[2]).unwrap()));
        assert!(!fly.is_open(&doc, 0));
    }

    #[test]
    fn test_single_sibling_horizontal_is_noop() {
        let (mut doc, _, nested, _) = fixture();
        let mut fly = Flyouts::mount(&doc, HoverDelays::default());
        let c = fly.index_of(nested).unwrap();
        assert_eq!(fly.move_horizontal(&mut doc, c, true, ms(0)), None);
    }

    #[test]
    fn test_vertical_keys_focus_sub_items() {
        let (mut doc, tops, _, subs) = fixture();
        let mut fly = Flyouts::mount(&doc, HoverDelays::default());
        let r = fly.key_down(&mut doc, tops[0], NavKey::ArrowDown, ms(0));
        assert_eq!(r, KeyResult::Focus(subs[0]));
        assert!(fly.is_open(&doc, 0));

        let r = fly.key_down(&mut doc, subs[0], NavKey::ArrowDown, ms(0));
        assert_eq!(r, KeyResult::Focus(subs[1]));
        let r = fly.key_down(&mut doc, subs[1], NavKey::Escape, ms(0));
        assert_eq!(r, KeyResult::Focus(tops[0]));
        assert!(!fly.is_open(&doc, 0));
    }

    #[test]
    fn test_outside_pointer_down_and_blur() {
        let (mut doc, tops, _, _) = fixture();
        let mut fly = Flyouts::mount(&doc, HoverDelays::default());
        fly.open(&mut doc, 0, true, ms(0));
        fly.pointer_down(&mut doc, Some(tops[0]));
        assert!(fly.is_open(&doc, 0));
        let body = doc.body();
        fly.pointer_down(&mut doc, Some(body));
        assert!(!fly.is_open(&doc, 0));

        fly.open(&mut doc, 1, false, ms(0));
        fly.blur(&mut doc);
        fly.tick(&mut doc, ms(1000));
        assert!(!fly.is_open(&doc, 1));
    }
}
