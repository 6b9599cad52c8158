//! Top-level menu triggers.

use std::time::Duration;

use tracing::{debug, trace};

use super::{is_disabled, Crossing, HoverDelays, KeyResult, MenuState, NavKey};
use crate::dom::{Document, NodeId};
use crate::timer::{earliest, Timer};

#[derive(Debug, Clone)]
struct Trigger {
    node: NodeId,
    menu: NodeId,
    delays: HoverDelays,
    open_timer: Timer,
    close_timer: Timer,
}

impl Trigger {
    fn clear_timers(&mut self) {
        self.open_timer.clear();
        self.close_timer.clear();
    }
}

/// Hover-intent engine for the menubar triggers.
///
/// Invariant: at most one trigger is expanded. Every path that expands a
/// trigger first collapses the others and cancels their timers.
#[derive(Debug, Clone, Default)]
pub struct HoverMenus {
    defaults: HoverDelays,
    triggers: Vec<Trigger>,
}

impl HoverMenus {
    /// Creates an engine with no triggers.
    #[must_use]
    pub fn new(defaults: HoverDelays) -> Self {
        Self {
            defaults,
            triggers: Vec::new(),
        }
    }

    /// Registers every `.iconDiv[data-hasmenu]` element in the document.
    pub fn mount(doc: &mut Document, defaults: HoverDelays) -> Self {
        let mut engine = Self::new(defaults);
        let candidates = doc.query_all(doc.root(), |d, n| {
            d.has_class(n, "iconDiv") && d.has_attr(n, "data-hasmenu")
        });
        for node in candidates {
            engine.register(doc, node);
        }
        engine
    }

    /// Registers one trigger. Its menu is the first descendant carrying
    /// `data-submenu`; a trigger without one loses its menu attributes and is
    /// not registered.
    pub fn register(&mut self, doc: &mut Document, node: NodeId) -> Option<usize> {
        if let Some(index) = self.index_of(node) {
            return Some(index);
        }
        let Some(menu) = doc.query(node, |d, n| d.has_attr(n, "data-submenu")) else {
            debug!("trigger without a menu, dropping popup attributes");
            doc.remove_attr(node, "data-hasmenu");
            doc.remove_attr(node, "aria-haspopup");
            doc.remove_attr(node, "aria-expanded");
            return None;
        };

        if doc.attr(menu, "id").map_or(true, str::is_empty) {
            let base = doc
                .attr(node, "aria-label")
                .unwrap_or("menu")
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join("-");
            doc.set_attr(menu, "id", &format!("menu-{base}"));
        }
        if let Some(id) = doc.attr(menu, "id").map(str::to_string) {
            doc.set_attr(node, "aria-controls", &id);
        }
        doc.set_attr(node, "aria-haspopup", "true");
        if !doc.has_attr(node, "aria-expanded") {
            doc.set_attr(node, "aria-expanded", "false");
        }

        self.triggers.push(Trigger {
            node,
            menu,
            delays: HoverDelays::for_trigger(doc, node, self.defaults),
            open_timer: Timer::default(),
            close_timer: Timer::default(),
        });
        let index = self.triggers.len() - 1;
        self.reset_item_tabindex(doc, index);
        Some(index)
    }

    /// Sets `tabindex=-1` on the menu items (roving focus). Call again after
    /// the menu content is re-rendered.
    pub fn reset_item_tabindex(&self, doc: &mut Document, index: usize) {
        for item in self.menu_items(doc, index) {
            if !doc.has_class(item, "has-submenu") {
                doc.set_attr(item, "tabindex", "-1");
            }
        }
    }

    /// Number of registered triggers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Trigger elements in registration order.
    #[must_use]
    pub fn trigger_nodes(&self) -> Vec<NodeId> {
        self.triggers.iter().map(|t| t.node).collect()
    }

    /// Index of the trigger element `node`.
    #[must_use]
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.triggers.iter().position(|t| t.node == node)
    }

    /// Index of the trigger whose subtree contains `node`.
    #[must_use]
    pub fn trigger_containing(&self, doc: &Document, node: NodeId) -> Option<usize> {
        self.triggers.iter().position(|t| doc.contains(t.node, node))
    }

    /// Trigger element at `index`.
    #[must_use]
    pub fn trigger_node(&self, index: usize) -> Option<NodeId> {
        self.triggers.get(index).map(|t| t.node)
    }

    /// Menu panel of the trigger at `index`.
    #[must_use]
    pub fn menu_node(&self, index: usize) -> Option<NodeId> {
        self.triggers.get(index).map(|t| t.menu)
    }

    /// Delays in effect for the trigger at `index`.
    #[must_use]
    pub fn delays(&self, index: usize) -> Option<HoverDelays> {
        self.triggers.get(index).map(|t| t.delays)
    }

    /// Focusable menu items of a trigger, excluding items of nested sublists.
    #[must_use]
    pub fn menu_items(&self, doc: &Document, index: usize) -> Vec<NodeId> {
        let Some(t) = self.triggers.get(index) else {
            return Vec::new();
        };
        let menu = t.menu;
        doc.query_all(menu, |d, n| {
            let is_item = d.attr(n, "role") == Some("menuitem")
                || d.has_class(n, "menu-item")
                || (d.tag(n) == Some("a") && d.has_class(n, "item"));
            let nested = d
                .parent(n)
                .and_then(|p| d.closest_class(p, "sublist"))
                .is_some_and(|sub| d.contains(menu, sub));
            is_item && !nested && !d.has_attr(n, "hidden")
        })
    }

    /// Whether the trigger at `index` is expanded.
    #[must_use]
    pub fn is_open(&self, doc: &Document, index: usize) -> bool {
        self.triggers
            .get(index)
            .is_some_and(|t| doc.attr(t.node, "aria-expanded") == Some("true"))
    }

    /// Current state of the trigger at `index`.
    #[must_use]
    pub fn state(&self, doc: &Document, index: usize) -> MenuState {
        let Some(t) = self.triggers.get(index) else {
            return MenuState::Collapsed;
        };
        MenuState::from_parts(
            self.is_open(doc, index),
            t.open_timer.is_armed(),
            t.close_timer.is_armed(),
        )
    }

    /// Index of the expanded trigger, if any.
    #[must_use]
    pub fn open_index(&self, doc: &Document) -> Option<usize> {
        (0..self.triggers.len()).find(|&i| self.is_open(doc, i))
    }

    fn enabled(&self, doc: &Document, index: usize) -> bool {
        self.triggers
            .get(index)
            .is_some_and(|t| !is_disabled(doc, t.node))
    }

    /// Cancels timers and collapses without touching the others.
    pub fn force_close(&mut self, doc: &mut Document, index: usize) {
        if let Some(t) = self.triggers.get_mut(index) {
            t.clear_timers();
            doc.set_attr(t.node, "aria-expanded", "false");
        }
    }

    fn force_close_others(&mut self, doc: &mut Document, index: usize) {
        for i in 0..self.triggers.len() {
            if i != index {
                self.force_close(doc, i);
            }
        }
    }

    /// Expands (exclusively) or collapses a trigger now.
    pub fn set_expanded(&mut self, doc: &mut Document, index: usize, on: bool) {
        if index >= self.triggers.len() {
            return;
        }
        if on {
            self.force_close_others(doc, index);
        }
        let t = &mut self.triggers[index];
        if !on {
            t.clear_timers();
        }
        trace!(index, on, "trigger expanded");
        doc.set_attr(t.node, "aria-expanded", if on { "true" } else { "false" });
    }

    fn schedule_open(&mut self, index: usize, now: Duration) {
        let t = &mut self.triggers[index];
        t.clear_timers();
        t.open_timer.arm(now, t.delays.open);
    }

    fn schedule_close(&mut self, index: usize, now: Duration) {
        let t = &mut self.triggers[index];
        t.clear_timers();
        t.close_timer.arm(now, t.delays.close);
    }

    /// Feeds a pointer move from `from` to `to` (either may be outside the
    /// document, as `None`). Leave handlers run before enter handlers.
    pub fn pointer_move(
        &mut self,
        doc: &mut Document,
        from: Option<NodeId>,
        to: Option<NodeId>,
        now: Duration,
    ) {
        let mut entered = Vec::new();
        let mut entered_menu = Vec::new();
        for i in 0..self.triggers.len() {
            if !self.enabled(doc, i) {
                continue;
            }
            let (node, menu) = (self.triggers[i].node, self.triggers[i].menu);
            let on_trigger = Crossing::of(doc, node, from, to);
            let on_menu = Crossing::of(doc, menu, from, to);

            // Leaving toward the trigger's own subtree keeps it open.
            if on_menu == Crossing::Leave && on_trigger != Crossing::Inside {
                self.schedule_close(i, now);
            }
            if on_trigger == Crossing::Leave {
                self.schedule_close(i, now);
            }
            if on_trigger == Crossing::Enter {
                entered.push(i);
            }
            if on_menu == Crossing::Enter {
                entered_menu.push(i);
            }
        }
        for i in entered {
            self.force_close_others(doc, i);
            self.schedule_open(i, now);
        }
        for i in entered_menu {
            self.force_close_others(doc, i);
            self.triggers[i].clear_timers();
            self.set_expanded(doc, i, true);
        }
    }

    /// Feeds a focus move. Focus arriving from outside a trigger expands it
    /// immediately; focus leaving a trigger schedules its close.
    pub fn focus_change(
        &mut self,
        doc: &mut Document,
        from: Option<NodeId>,
        to: Option<NodeId>,
        now: Duration,
    ) {
        let mut entered = None;
        for i in 0..self.triggers.len() {
            if !self.enabled(doc, i) {
                continue;
            }
            match Crossing::of(doc, self.triggers[i].node, from, to) {
                Crossing::Leave => self.schedule_close(i, now),
                Crossing::Enter => entered = Some(i),
                Crossing::Inside | Crossing::Outside => {}
            }
        }
        if let Some(i) = entered {
            self.set_expanded(doc, i, true);
        }
    }

    fn step_trigger(&self, doc: &Document, from: usize, forward: bool) -> Option<NodeId> {
        let n = self.triggers.len();
        (1..=n)
            .map(|k| if forward { (from + k) % n } else { (from + n - k) % n })
            .find(|&i| self.enabled(doc, i))
            .map(|i| self.triggers[i].node)
    }

    fn edge_trigger(&self, doc: &Document, first: bool) -> Option<NodeId> {
        let mut enabled = (0..self.triggers.len()).filter(|&i| self.enabled(doc, i));
        let index = if first { enabled.next() } else { enabled.last() };
        index.map(|i| self.triggers[i].node)
    }

    fn focus_or_handled(target: Option<NodeId>) -> KeyResult {
        target.map_or(KeyResult::Handled, KeyResult::Focus)
    }

    /// Handles a key press while `focused` has focus.
    pub fn key_down(&mut self, doc: &mut Document, focused: NodeId, key: NavKey) -> KeyResult {
        let Some(index) = self.trigger_containing(doc, focused) else {
            return KeyResult::Ignored;
        };
        if !self.enabled(doc, index) {
            return KeyResult::Ignored;
        }
        let (node, menu) = (self.triggers[index].node, self.triggers[index].menu);

        if doc.contains(menu, focused) {
            return self.menu_key(doc, index, focused, key);
        }

        let on_trigger = focused == node;
        match key {
            NavKey::Enter | NavKey::Space | NavKey::ArrowDown if on_trigger => {
                self.set_expanded(doc, index, true);
                let first = self.menu_items(doc, index).first().copied();
                KeyResult::Focus(first.unwrap_or(menu))
            }
            NavKey::ArrowUp if on_trigger => {
                self.set_expanded(doc, index, true);
                let last = self.menu_items(doc, index).last().copied();
                KeyResult::Focus(last.unwrap_or(menu))
            }
            NavKey::ArrowRight => Self::focus_or_handled(self.step_trigger(doc, index, true)),
            NavKey::ArrowLeft => Self::focus_or_handled(self.step_trigger(doc, index, false)),
            NavKey::Home => Self::focus_or_handled(self.edge_trigger(doc, true)),
            NavKey::End => Self::focus_or_handled(self.edge_trigger(doc, false)),
            NavKey::Escape => {
                self.set_expanded(doc, index, false);
                KeyResult::Focus(node)
            }
            _ => KeyResult::Ignored,
        }
    }

    fn menu_key(&mut self, doc: &mut Document, index: usize, focused: NodeId, key: NavKey) -> KeyResult {
        let items = self.menu_items(doc, index);
        let len = items.len();
        let pos = items.iter().position(|&n| n == focused);
        match key {
            NavKey::ArrowDown => {
                let next = pos.map_or(0, |p| (p + 1) % len.max(1));
                Self::focus_or_handled(items.get(next).copied())
            }
            NavKey::ArrowUp => {
                let prev = pos.map_or(len.saturating_sub(1), |p| (p + len - 1) % len);
                Self::focus_or_handled(items.get(prev).copied())
            }
            NavKey::Home => Self::focus_or_handled(items.first().copied()),
            NavKey::End => Self::focus_or_handled(items.last().copied()),
            NavKey::Escape => {
                self.set_expanded(doc, index, false);
                KeyResult::Focus(self.triggers[index].node)
            }
            NavKey::ArrowRight => Self::focus_or_handled(self.step_trigger(doc, index, true)),
            NavKey::ArrowLeft => Self::focus_or_handled(self.step_trigger(doc, index, false)),
            _ => KeyResult::Ignored,
        }
    }

    /// Handles a click. A click on a menu item collapses its menu; returns
    /// true when that happened.
    pub fn click_in_menu(&mut self, doc: &mut Document, target: NodeId) -> bool {
        let Some(index) = self.trigger_containing(doc, target) else {
            return false;
        };
        let menu = self.triggers[index].menu;
        if !doc.contains(menu, target) {
            return false;
        }
        let item = doc.closest(target, |d, n| {
            d.attr(n, "role") == Some("menuitem")
                || d.has_class(n, "menu-item")
                || (d.tag(n) == Some("a") && d.has_attr(n, "href"))
        });
        if item.is_some_and(|i| doc.contains(menu, i)) {
            self.set_expanded(doc, index, false);
            true
        } else {
            false
        }
    }

    /// Toggles a trigger (button click). Callers close the other menus first.
    pub fn toggle(&mut self, doc: &mut Document, index: usize) {
        if !self.enabled(doc, index) {
            return;
        }
        let open = self.is_open(doc, index);
        self.set_expanded(doc, index, !open);
    }

    /// A pointer-down outside every trigger collapses all of them.
    pub fn pointer_down(&mut self, doc: &mut Document, target: Option<NodeId>) {
        let inside = target.is_some_and(|t| self.trigger_containing(doc, t).is_some());
        if !inside {
            self.close_all(doc);
        }
    }

    /// Collapses every trigger and cancels all timers.
    pub fn close_all(&mut self, doc: &mut Document) {
        for i in 0..self.triggers.len() {
            self.force_close(doc, i);
        }
    }

    /// Runs due timers in deadline order.
    pub fn tick(&mut self, doc: &mut Document, now: Duration) {
        loop {
            let due = self
                .triggers
                .iter()
                .enumerate()
                .flat_map(|(i, t)| {
                    [
                        t.open_timer.deadline().map(|d| (d, i, true)),
                        t.close_timer.deadline().map(|d| (d, i, false)),
                    ]
                })
                .flatten()
                .filter(|(d, _, _)| *d <= now)
                .min();
            let Some((_, index, open)) = due else {
                break;
            };
            if open {
                self.triggers[index].open_timer.clear();
                self.set_expanded(doc, index, true);
            } else {
                self.triggers[index].close_timer.clear();
                self.set_expanded(doc, index, false);
            }
        }
    }

    /// Earliest pending timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        earliest(
            self.triggers
                .iter()
                .flat_map(|t| [t.open_timer.deadline(), t.close_timer.deadline()]),
        )
    }
}
