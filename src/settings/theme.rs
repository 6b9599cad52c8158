//! Page theme (`data-theme`) with persistence.

use serde::{Deserialize, Serialize};

use crate::config::ThemeMode;
use crate::constants::THEME_STORAGE_KEY;
use crate::dom::Document;
use crate::storage::Storage;

/// Theme applied to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PageTheme {
    /// Light color scheme.
    #[default]
    Light,
    /// Dark color scheme.
    Dark,
}

impl PageTheme {
    /// Value written to `data-theme` and storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Anything but `dark` is light.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim() == "dark" {
            Self::Dark
        } else {
            Self::Light
        }
    }

    /// Asks the OS via `dark-light`; unknown modes fall back to light.
    #[must_use]
    pub fn detect() -> Self {
        match dark_light::detect() {
            Ok(dark_light::Mode::Dark) => Self::Dark,
            Ok(dark_light::Mode::Light | dark_light::Mode::Unspecified) | Err(_) => Self::Light,
        }
    }

    /// Resolves a configured mode.
    #[must_use]
    pub fn from_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Auto => Self::detect(),
            ThemeMode::Dark => Self::Dark,
            ThemeMode::Light => Self::Light,
        }
    }

    /// The other theme.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Saved theme, or the configured mode when nothing is saved.
#[must_use]
pub fn initial_theme(storage: &Storage, mode: ThemeMode) -> PageTheme {
    storage
        .get_raw(THEME_STORAGE_KEY)
        .map_or_else(|| PageTheme::from_mode(mode), |raw| PageTheme::parse(&raw))
}

/// Writes `data-theme` and `color-scheme`, persists the choice and syncs the
/// `#theme-toggle` checkbox.
pub fn apply_theme(doc: &mut Document, storage: &Storage, theme: PageTheme) {
    let root = doc.root();
    doc.set_attr(root, "data-theme", theme.as_str());
    doc.set_attr(root, "style", &format!("color-scheme: {}", theme.as_str()));
    storage.set_raw(THEME_STORAGE_KEY, theme.as_str());

    if let Some(toggle) = doc.element_by_id("theme-toggle") {
        let dark = theme == PageTheme::Dark;
        doc.toggle_attr(toggle, "checked", dark);
        doc.set_attr(toggle, "aria-checked", if dark { "true" } else { "false" });
    }
}
