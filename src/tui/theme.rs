//! Terminal colors for the menubar preview.
//!
//! The palette follows the page theme, so flipping `#theme-toggle` in the
//! settings panel repaints the terminal too.

use ratatui::style::Color;

use crate::config::ThemeMode;
use crate::settings::PageTheme;

/// Semantic color theme for the TUI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Borders and titles
    pub primary: Color,
    /// Focus ring and expanded triggers
    pub accent: Color,
    /// Enabled switches
    pub success: Color,
    /// Error messages and `delete` entries
    pub error: Color,
    /// `special` entries
    pub special: Color,

    /// Primary text content color
    pub text: Color,
    /// Hints and separators
    pub text_muted: Color,

    /// Main background color
    pub background: Color,
    /// Background of the hovered or focused row
    pub highlight_bg: Color,
    /// Dropdown and popup surface
    pub surface: Color,
}

impl Theme {
    /// Palette for dark pages.
    #[must_use]
    pub const fn dark() -> Self {
        Self {
            primary: Color::Cyan,
            accent: Color::Yellow,
            success: Color::Green,
            error: Color::Red,
            special: Color::LightBlue,

            text: Color::White,
            text_muted: Color::DarkGray,

            background: Color::Black,
            highlight_bg: Color::DarkGray,
            surface: Color::Rgb(30, 30, 30),
        }
    }

    /// Palette for light pages.
    #[must_use]
    pub const fn light() -> Self {
        Self {
            primary: Color::Blue,
            accent: Color::Rgb(180, 100, 0),
            success: Color::Rgb(0, 128, 0),
            error: Color::Red,
            special: Color::Rgb(0, 90, 160),

            text: Color::Black,
            text_muted: Color::Gray,

            background: Color::White,
            highlight_bg: Color::Rgb(230, 230, 230),
            surface: Color::Rgb(245, 245, 245),
        }
    }

    /// Palette matching the page theme.
    #[must_use]
    pub const fn for_page(theme: PageTheme) -> Self {
        match theme {
            PageTheme::Dark => Self::dark(),
            PageTheme::Light => Self::light(),
        }
    }

    /// Palette for a configured mode; `Auto` asks the OS.
    #[must_use]
    pub fn from_mode(mode: ThemeMode) -> Self {
        Self::for_page(PageTheme::from_mode(mode))
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_mode(ThemeMode::Auto)
    }
}
