//! Settings: switches, extras, theme and the settings panel.
//!
//! [`ToggleBus`] is the source of truth for the switches. It persists to
//! storage and publishes [`ToggleChange`]s; the DOM side (switch grid, menu
//! visibility, ambient mode) is applied by whoever owns the document.

pub mod extras;
pub mod grid;
pub mod menu_switches;
pub mod panel;
pub mod theme;
pub mod toggles;

pub use extras::{apply_extra, ExtraChange, Extras, EXTRA_TOGGLES};
pub use menu_switches::{apply_ambient, menu_trigger, set_menu_enabled};
pub use panel::{SettingsPanel, TooltipCooldown};
pub use theme::{apply_theme, initial_theme, PageTheme};
pub use toggles::{
    default_items, SetOptions, ToggleBus, ToggleChange, ToggleEntry, ToggleItem, AMBIENT_SWITCH,
    MENU_SWITCHES,
};
