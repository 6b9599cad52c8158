//! The navigation shell.
//!
//! [`NavShell`] owns the document, the store and every engine, and routes
//! host input (pointer, focus, keys, clicks, clock) to them. Toggle and
//! extras changes travel over channels from the buses and are applied to the
//! document after each input.

use anyhow::{Context, Result};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use crate::config::{Config, ThemeMode};
use crate::constants::{DEFAULT_HOTBUTTONS, SWITCHES_STORAGE_KEY};
use crate::dom::{Document, NodeId};
use crate::expandable::Expandables;
use crate::hotbutton::{HotbuttonClick, HotbuttonConfig, Hotbuttons, SvgError};
use crate::hover::{Flyouts, HoverDelays, HoverMenus, KeyResult, Modifiers, NavKey};
use crate::inbox::InboxBadge;
use crate::menu::{self, Catalog, MenuNode, Navigation};
use crate::search::{SearchAction, SearchBox, SearchRequest};
use crate::settings::extras::render_extras;
use crate::settings::grid::{self, render_grid, render_table};
use crate::settings::{
    apply_ambient, apply_extra, apply_theme, default_items, initial_theme, set_menu_enabled,
    ExtraChange, Extras, PageTheme, SettingsPanel, ToggleBus, ToggleChange, TooltipCooldown,
    AMBIENT_SWITCH, EXTRA_TOGGLES, MENU_SWITCHES,
};
use crate::storage::{FileStore, Storage};
use crate::timer::earliest;

/// Search scopes offered by the page skeleton, in menu order.
const SCOPES: [(&str, &str); 9] = [
    ("general", "General"),
    ("quotes", "Quotes"),
    ("account", "Account"),
    ("email", "Email"),
    ("amount", "Amount"),
    ("order", "Order"),
    ("phone", "Phone"),
    ("invoice", "Invoice"),
    ("po", "Purchase Order"),
];

/// Knobs taken from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellOptions {
    /// Default hover delays.
    pub delays: HoverDelays,
    /// Double Enter / Escape window.
    pub double_press: Duration,
    /// Theme used when none is saved.
    pub theme_mode: ThemeMode,
    /// Pick up switch blobs written by other sessions.
    pub live_sync: bool,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ShellOptions {
    fn from(config: &Config) -> Self {
        Self {
            delays: config.timing.delays(),
            double_press: config.timing.double_press(),
            theme_mode: config.ui.theme_mode,
            live_sync: config.ui.live_sync,
        }
    }
}

/// Something the host has to carry out after an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Follow a link.
    Navigate(Navigation),
    /// Post a search.
    Submit(SearchRequest),
    /// Move focus to a node.
    Focus(NodeId),
    /// Drop focus.
    Blur,
}

/// Builds the menubar skeleton the shell mounts on: one trigger per catalog
/// menu, the given hotbuttons, the inbox, search and the settings panel.
pub fn build_page(doc: &mut Document, catalog: &Catalog, hotbutton_keys: &[&str]) {
    let body = doc.body();
    let header = doc.create_element_with_class("header", "menu-top");
    let bar = doc.create_element_with_class("nav", "menubar");
    doc.set_attr(bar, "role", "menubar");

    for def in &catalog.menus {
        let trigger = doc.create_element_with_class("div", "iconDiv");
        doc.set_attr(trigger, "data-key", &def.key);
        doc.set_attr(trigger, "data-hasmenu", "");
        doc.set_attr(trigger, "tabindex", "0");
        doc.set_attr(trigger, "aria-label", &def.label);
        let label = doc.create_element_with_class("span", "text");
        doc.set_text(label, &def.label);
        let menu = doc.create_element_with_class("div", "submenu");
        doc.set_attr(menu, "data-submenu", "");
        doc.set_attr(menu, "id", &format!("menu-{}", def.key));
        doc.append_child(trigger, label);
        doc.append_child(trigger, menu);
        doc.append_child(bar, trigger);
    }

    for key in hotbutton_keys {
        let button = doc.create_element_with_class("div", "iconDiv hotbutton");
        doc.set_attr(button, "data-key", key);
        doc.set_attr(button, "tabindex", "0");
        doc.set_attr(button, "aria-label", &format!("Hot Button {key}"));
        let icon = doc.create_element_with_class("div", "iconSVG");
        doc.set_markup(icon, catalog.icons.blank());
        let label = doc.create_element_with_class("span", "text");
        doc.set_text(label, key);
        doc.append_child(button, icon);
        doc.append_child(button, label);
        doc.append_child(bar, button);
    }

    let inbox = doc.create_element_with_class("div", "iconDiv");
    doc.set_attr(inbox, "data-key", "inbox");
    doc.set_attr(inbox, "tabindex", "0");
    let inbox_label = doc.create_element_with_class("span", "text");
    doc.set_text(inbox_label, "Inbox");
    let badge = doc.create_element_with_class("span", "badge");
    doc.set_attr(badge, "id", "inbox-badge");
    doc.set_attr(badge, "hidden", "");
    doc.append_child(inbox, inbox_label);
    doc.append_child(inbox, badge);
    doc.append_child(bar, inbox);
    doc.append_child(header, bar);

    let group = doc.create_element_with_class("div", "group");
    doc.set_attr(group, "role", "search");
    let input = doc.create_element("input");
    doc.set_attr(input, "type", "search");
    doc.set_attr(input, "name", "search");
    doc.append_child(group, input);
    doc.append_child(header, group);

    let trigger = doc.create_element("button");
    doc.set_attr(trigger, "id", "searchTrigger");
    doc.set_attr(trigger, "type", "button");
    doc.set_attr(trigger, "aria-expanded", "false");
    doc.set_text(trigger, "Scope");
    let menu = doc.create_element("div");
    doc.set_attr(menu, "id", "searchMenu");
    let form = doc.create_element("form");
    doc.set_attr(form, "id", "searchScopeForm");
    for (i, (value, label)) in SCOPES.iter().enumerate() {
        let option = doc.create_element("label");
        let radio = doc.create_element("input");
        doc.set_attr(radio, "type", "radio");
        doc.set_attr(radio, "name", "searchScope");
        doc.set_attr(radio, "value", value);
        doc.toggle_attr(radio, "checked", i == 0);
        let text = doc.create_text(label);
        doc.append_child(option, radio);
        doc.append_child(option, text);
        doc.append_child(form, option);
    }
    doc.append_child(menu, form);
    doc.append_child(header, trigger);
    doc.append_child(header, menu);

    let settings = doc.create_element("button");
    doc.set_attr(settings, "id", "settings-toggle");
    doc.set_attr(settings, "type", "button");
    doc.set_text(settings, "Settings");
    let panel = doc.create_element("div");
    doc.set_attr(panel, "id", "menu-settings");
    let switches = doc.create_element("div");
    doc.set_attr(switches, "id", "st_group");
    let theme = doc.create_element("input");
    doc.set_attr(theme, "type", "checkbox");
    doc.set_attr(theme, "id", "theme-toggle");
    doc.set_attr(theme, "aria-label", "Dark theme");
    doc.append_child(panel, switches);
    doc.append_child(panel, theme);
    doc.append_child(header, settings);
    doc.append_child(header, panel);

    doc.append_child(body, header);
}

/// Owns the document and every engine.
#[derive(Debug)]
pub struct NavShell {
    doc: Document,
    storage: Storage,
    catalog: Catalog,
    hover: HoverMenus,
    flyouts: Flyouts,
    expandables: Expandables,
    toggles: ToggleBus,
    toggle_rx: Receiver<ToggleChange>,
    extras: Extras,
    extra_rx: Receiver<ExtraChange>,
    panel: Option<SettingsPanel>,
    hotbuttons: Hotbuttons,
    search: Option<SearchBox>,
    inbox: Option<InboxBadge>,
    tooltips: TooltipCooldown,
    theme: PageTheme,
    live_sync: bool,
    focused: Option<NodeId>,
    hovered: Option<NodeId>,
    now: Duration,
}

impl NavShell {
    /// Renders the catalog into `doc` and mounts every component found there.
    pub fn mount(mut doc: Document, storage: Storage, catalog: Catalog, options: ShellOptions) -> Self {
        menu::render_all(&mut doc, &catalog);
        let hover = HoverMenus::mount(&mut doc, options.delays);
        let flyouts = Flyouts::mount(&doc, options.delays);
        let mut expandables = Expandables::new();

        let mut toggles = ToggleBus::load(storage.clone(), default_items());
        let (toggle_tx, toggle_rx) = mpsc::channel();
        toggles.subscribe_all(move |change| {
            // The receiver lives as long as the shell.
            let _ = toggle_tx.send(change.clone());
        });
        if let Some(group) = doc.element_by_id("st_group") {
            render_grid(&mut doc, group, &toggles);
        }

        let mut extras = Extras::load(storage.clone());
        let (extra_tx, extra_rx) = mpsc::channel();
        extras.subscribe_all(move |change| {
            let _ = extra_tx.send(change.clone());
        });
        let panel = SettingsPanel::mount(&mut doc, &mut expandables, storage.clone());
        if let Some(panel) = &panel {
            render_extras(&mut doc, panel.panel(), &extras);
        }

        let theme = initial_theme(&storage, options.theme_mode);
        let hotbuttons = Hotbuttons::mount(&mut doc, storage.clone());
        let search = SearchBox::mount(&mut doc).map(|s| s.with_double_press(options.double_press));
        let inbox = InboxBadge::mount(&mut doc);

        let mut shell = Self {
            doc,
            storage,
            catalog,
            hover,
            flyouts,
            expandables,
            toggles,
            toggle_rx,
            extras,
            extra_rx,
            panel,
            hotbuttons,
            search,
            inbox,
            tooltips: TooltipCooldown::default(),
            theme,
            live_sync: options.live_sync,
            focused: None,
            hovered: None,
            now: Duration::ZERO,
        };
        shell.apply_all_toggles();
        for toggle in &EXTRA_TOGGLES {
            let on = shell.extras.get(toggle.id);
            apply_extra(&mut shell.doc, toggle.id, on);
        }
        apply_theme(&mut shell.doc, &shell.storage, shell.theme);
        tracing::debug!(
            "Shell mounted: {} triggers, {} flyouts, {} hotbuttons",
            shell.hover.len(),
            shell.flyouts.len(),
            shell.hotbuttons.len()
        );
        shell
    }

    /// Builds the skeleton page and mounts on it.
    pub fn with_skeleton(storage: Storage, catalog: Catalog, hotbutton_keys: &[&str], options: ShellOptions) -> Self {
        let mut doc = Document::new();
        build_page(&mut doc, &catalog, hotbutton_keys);
        Self::mount(doc, storage, catalog, options)
    }

    /// Opens the configured store and catalog and mounts on the skeleton
    /// page with the default hotbuttons.
    pub fn from_config(config: &Config) -> Result<Self> {
        let path = config.store_path()?;
        let store = FileStore::open(&path).context(format!("Failed to open store: {}", path.display()))?;
        let catalog = config.load_catalog()?;
        Ok(Self::with_skeleton(
            Storage::new(store),
            catalog,
            &DEFAULT_HOTBUTTONS,
            ShellOptions::from(config),
        ))
    }

    /// The document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.doc
    }

    /// Serialized page.
    #[must_use]
    pub fn html(&self) -> String {
        self.doc.to_html(self.doc.root())
    }

    /// The store handle.
    #[must_use]
    pub const fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The menu catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Top-level trigger engine.
    #[must_use]
    pub const fn hover(&self) -> &HoverMenus {
        &self.hover
    }

    /// Nested flyout engine.
    #[must_use]
    pub const fn flyouts(&self) -> &Flyouts {
        &self.flyouts
    }

    /// Switch state.
    #[must_use]
    pub const fn toggles(&self) -> &ToggleBus {
        &self.toggles
    }

    /// Extra toggle state.
    #[must_use]
    pub const fn extras(&self) -> &Extras {
        &self.extras
    }

    /// Mounted hotbuttons.
    #[must_use]
    pub const fn hotbuttons(&self) -> &Hotbuttons {
        &self.hotbuttons
    }

    /// Mounted search box.
    #[must_use]
    pub const fn search(&self) -> Option<&SearchBox> {
        self.search.as_ref()
    }

    /// Current theme.
    #[must_use]
    pub const fn theme(&self) -> PageTheme {
        self.theme
    }

    /// Node holding focus.
    #[must_use]
    pub const fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Node under the pointer.
    #[must_use]
    pub const fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    /// Current clock.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Runs `f` with the hotbuttons and the document.
    pub fn with_hotbuttons<R>(&mut self, f: impl FnOnce(&mut Hotbuttons, &mut Document) -> R) -> R {
        f(&mut self.hotbuttons, &mut self.doc)
    }

    // Clock

    /// Advances the clock and runs due timers.
    pub fn advance(&mut self, now: Duration) {
        self.now = now.max(self.now);
        self.hover.tick(&mut self.doc, self.now);
        self.flyouts.tick(&mut self.doc, self.now);
        self.tooltips.tick(&mut self.doc, self.now);
    }

    /// Earliest pending timer across all engines.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        earliest([
            self.hover.next_deadline(),
            self.flyouts.next_deadline(),
            self.tooltips.next_deadline(),
        ])
    }

    // Pointer and focus

    /// The pointer now rests over `to` (`None`: outside the page).
    pub fn pointer_move(&mut self, to: Option<NodeId>) {
        let from = self.hovered;
        if from == to {
            return;
        }
        self.hover.pointer_move(&mut self.doc, from, to, self.now);
        self.flyouts.pointer_move(&mut self.doc, from, to, self.now);
        self.hovered = to;
    }

    /// Focus moves to `to`.
    pub fn focus(&mut self, to: Option<NodeId>) {
        let from = self.focused;
        if from == to {
            return;
        }
        self.hover.focus_change(&mut self.doc, from, to, self.now);
        self.flyouts.focus_change(&mut self.doc, from, to, self.now);
        self.focused = to;
    }

    /// Pointer pressed on `target` (`None`: outside the page).
    pub fn pointer_down(&mut self, target: Option<NodeId>) {
        self.hover.pointer_down(&mut self.doc, target);
        self.flyouts.pointer_down(&mut self.doc, target);
        match target {
            Some(t) => self.expandables.pointer_down(&mut self.doc, t),
            None => self.expandables.close_all(&mut self.doc, None),
        }
    }

    /// The window lost focus.
    pub fn window_blur(&mut self) {
        self.flyouts.blur(&mut self.doc);
    }

    /// Click on `target`.
    pub fn click(&mut self, target: NodeId, mods: Modifiers) -> Option<Effect> {
        let root = self.doc.root();
        self.tooltips.activate(&mut self.doc, root, target, self.now);

        match self.hotbuttons.click(&mut self.doc, target, mods) {
            HotbuttonClick::Navigate(nav) => return Some(Effect::Navigate(nav)),
            HotbuttonClick::EditorOpened | HotbuttonClick::Unset => return None,
            HotbuttonClick::Ignored => {}
        }

        if let Some(panel) = &self.panel {
            if self.doc.contains(panel.button(), target) || panel.is_hotzone(&self.doc, target) {
                panel.toggle(&mut self.doc, &mut self.expandables);
                return None;
            }
        }

        if let Some(effect) = self.click_control(target) {
            return effect;
        }

        if self.flyouts.click(&mut self.doc, target, self.now) {
            return None;
        }

        if let Some(nav) = menu::navigation_at(&self.doc, target) {
            self.close_all_menus();
            return Some(Effect::Navigate(nav));
        }

        if let Some(index) = self.hover.trigger_containing(&self.doc, target) {
            let in_menu = self
                .hover
                .menu_node(index)
                .is_some_and(|m| self.doc.contains(m, target));
            if !in_menu {
                let was_open = self.hover.is_open(&self.doc, index);
                self.close_all_menus();
                if !was_open {
                    self.hover.toggle(&mut self.doc, index);
                }
                return None;
            }
            self.hover.click_in_menu(&mut self.doc, target);
        }
        None
    }

    /// Panel, switch and search controls. `Some` when the click was consumed.
    fn click_control(&mut self, target: NodeId) -> Option<Option<Effect>> {
        let doc = &self.doc;
        if doc.has_class(target, "st_input") {
            let key = doc.attr(target, "data-key")?.to_string();
            let value = !doc.has_attr(target, "checked");
            self.toggles.user_flip(&key, value);
            self.drain_changes();
            return Some(None);
        }
        if let Some(toggle) = EXTRA_TOGGLES.iter().find(|t| doc.attr(target, "id") == Some(t.id)) {
            let value = !doc.has_attr(target, "checked");
            self.extras.set(toggle.id, value);
            self.drain_changes();
            return Some(None);
        }
        if doc.attr(target, "id") == Some("theme-toggle") {
            self.set_theme(self.theme.flipped());
            return Some(None);
        }
        if let Some(panel) = &self.panel {
            if doc.contains(panel.panel(), target) && doc.tag(target) == Some("input") {
                // Let the control change first, then persist the form.
                let checkable = matches!(doc.attr(target, "type"), Some("checkbox" | "radio"));
                if checkable {
                    let on = !doc.has_attr(target, "checked");
                    self.doc.toggle_attr(target, "checked", on);
                }
                panel.form_changed(&self.doc);
                return Some(None);
            }
        }
        let search = self.search.as_ref()?;
        if search.is_trigger(&self.doc, target) {
            search.toggle_menu(&mut self.doc, &mut self.expandables);
            return Some(None);
        }
        if search.pick_scope(&mut self.doc, &mut self.expandables, target) {
            return Some(None);
        }
        None
    }

    // Keyboard

    /// Key press delivered to the focused node.
    pub fn key(&mut self, key: NavKey, mods: Modifiers) -> Option<Effect> {
        if key == NavKey::Escape && self.hotbuttons.escape(&mut self.doc) {
            return None;
        }

        if let Some(search) = &mut self.search {
            match search.key_down(&self.doc, self.focused, key, mods, self.now) {
                SearchAction::None => {}
                SearchAction::FocusInput => {
                    let input = search.input();
                    self.focus(Some(input));
                    return Some(Effect::Focus(input));
                }
                SearchAction::Blur => {
                    self.focus(None);
                    return Some(Effect::Blur);
                }
                SearchAction::Submit(request) => return Some(Effect::Submit(request)),
            }
        }

        if let Some(focused) = self.focused {
            if matches!(key, NavKey::Enter | NavKey::Space)
                && self.doc.tag(focused) == Some("input")
                && self.doc.attr(focused, "type") == Some("checkbox")
            {
                return self.click(focused, mods);
            }

            let mut result = self.flyouts.key_down(&mut self.doc, focused, key, self.now);
            if result == KeyResult::Ignored {
                result = self.hover.key_down(&mut self.doc, focused, key);
            }
            match result {
                KeyResult::Focus(node) => {
                    self.focus(Some(node));
                    return Some(Effect::Focus(node));
                }
                KeyResult::Handled => return None,
                KeyResult::Ignored => {}
            }
        }

        if key == NavKey::Escape {
            if let Some(control) = self.expandables.escape(&mut self.doc) {
                self.focus(Some(control));
                return Some(Effect::Focus(control));
            }
        }
        None
    }

    // State changes from outside the page

    /// Flips a switch as the user would.
    pub fn set_toggle(&mut self, key: &str, value: bool) -> Option<ToggleChange> {
        let change = self.toggles.user_flip(key, value);
        self.drain_changes();
        change
    }

    /// Sets an extra toggle.
    pub fn set_extra(&mut self, id: &str, value: bool) -> Option<ExtraChange> {
        let change = self.extras.set(id, value);
        self.drain_changes();
        change
    }

    /// Applies and persists a theme.
    pub fn set_theme(&mut self, theme: PageTheme) {
        self.theme = theme;
        apply_theme(&mut self.doc, &self.storage, theme);
    }

    /// Re-reads the switch blob when live sync is on. Returns how many
    /// switches were applied.
    pub fn sync_external(&mut self) -> usize {
        if !self.live_sync {
            return 0;
        }
        let Some(raw) = self.storage.get_raw(SWITCHES_STORAGE_KEY) else {
            return 0;
        };
        let applied = self.toggles.apply_external(&raw);
        self.drain_changes();
        applied
    }

    /// Replaces and re-renders one menu.
    pub fn set_menu(&mut self, key: &str, items: Vec<MenuNode>) -> bool {
        let rendered = menu::set_menu(&mut self.doc, &mut self.catalog, key, items).is_some();
        self.flyouts.sync(&self.doc);
        if let Some(index) = menu::menu_host(&self.doc, key)
            .and_then(|host| self.hover.trigger_containing(&self.doc, host))
        {
            self.hover.reset_item_tabindex(&mut self.doc, index);
        }
        rendered
    }

    /// Collapses every trigger and flyout.
    pub fn close_all_menus(&mut self) {
        self.hover.close_all(&mut self.doc);
        self.flyouts.close_all(&mut self.doc);
        menu::close_all_menus(&mut self.doc);
    }

    /// Stores and applies a hotbutton config.
    ///
    /// # Errors
    ///
    /// Returns [`SvgError`] when the icon is rejected.
    pub fn set_hotbutton(&mut self, key: &str, config: &HotbuttonConfig) -> Result<Option<HotbuttonConfig>, SvgError> {
        self.hotbuttons.set_config(&mut self.doc, key, config)
    }

    /// Removes a hotbutton config.
    pub fn clear_hotbutton(&mut self, key: &str) {
        self.hotbuttons.clear(&mut self.doc, key);
    }

    /// Shows an unread count on the inbox badge.
    pub fn set_inbox_count(&mut self, count: u64) {
        if let Some(inbox) = self.inbox {
            inbox.set_count(&mut self.doc, count);
        }
    }

    /// Adapts the search placeholder to the menubar width.
    pub fn set_search_width(&mut self, width: f64) {
        if let Some(search) = &self.search {
            search.set_width(&mut self.doc, width);
        }
    }

    /// Types into the search box.
    pub fn set_search_query(&mut self, query: &str) {
        if let Some(search) = &self.search {
            search.set_query(&mut self.doc, query);
        }
    }

    // Bus effects

    fn apply_toggle(&mut self, key: &str, value: bool) {
        if let Some((_, menu_key)) = MENU_SWITCHES.iter().find(|(k, _)| *k == key) {
            set_menu_enabled(&mut self.doc, &mut self.hover, menu_key, value);
        }
        if key == AMBIENT_SWITCH {
            apply_ambient(&mut self.doc, value);
        }
        if let Some(item) = self.toggles.item(key) {
            let tooltip = grid::user_tooltip(item, value);
            grid::sync_switch(&mut self.doc, key, value, &tooltip);
        }
    }

    fn apply_all_toggles(&mut self) {
        for entry in self.toggles.list() {
            self.apply_toggle(&entry.key, entry.value);
        }
        render_table(&mut self.doc, &self.toggles);
    }

    fn drain_changes(&mut self) {
        let toggles: Vec<ToggleChange> = self.toggle_rx.try_iter().collect();
        for change in &toggles {
            self.apply_toggle(&change.key, change.value);
        }
        if !toggles.is_empty() {
            render_table(&mut self.doc, &self.toggles);
        }
        let extras: Vec<ExtraChange> = self.extra_rx.try_iter().collect();
        for change in extras {
            apply_extra(&mut self.doc, &change.id, change.value);
        }
    }
}
