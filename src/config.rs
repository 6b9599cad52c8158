//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application configuration
//! in TOML format with platform-specific directory resolution.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    APP_NAME, CONFIG_DIR_ENV, DEFAULT_CLOSE_DELAY, DEFAULT_OPEN_DELAY, DOUBLE_PRESS_THRESHOLD,
};
use crate::hover::HoverDelays;
use crate::menu::Catalog;
use crate::order_review::NotificationContacts;

/// Theme display mode preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ThemeMode {
    /// Automatically detect OS theme (dark/light)
    #[default]
    Auto,
    /// Always use dark theme
    Dark,
    /// Always use light theme
    Light,
}

/// Persistent store location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// JSON store file; defaults to `store.json` next to the config file
    pub path: Option<PathBuf>,
}

/// Hover and keyboard timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Delay before a hovered menu opens
    #[serde(default = "default_open_delay_ms")]
    pub open_delay_ms: u64,
    /// Delay before a left menu closes
    #[serde(default = "default_close_delay_ms")]
    pub close_delay_ms: u64,
    /// Window for double Enter / double Escape
    #[serde(default = "default_double_press_ms")]
    pub double_press_ms: u64,
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn default_open_delay_ms() -> u64 {
    millis(DEFAULT_OPEN_DELAY)
}

fn default_close_delay_ms() -> u64 {
    millis(DEFAULT_CLOSE_DELAY)
}

fn default_double_press_ms() -> u64 {
    millis(DOUBLE_PRESS_THRESHOLD)
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            open_delay_ms: default_open_delay_ms(),
            close_delay_ms: default_close_delay_ms(),
            double_press_ms: default_double_press_ms(),
        }
    }
}

impl TimingConfig {
    /// Default hover delays for triggers and flyouts.
    #[must_use]
    pub const fn delays(&self) -> HoverDelays {
        HoverDelays {
            open: Duration::from_millis(self.open_delay_ms),
            close: Duration::from_millis(self.close_delay_ms),
        }
    }

    /// Double-press window.
    #[must_use]
    pub const fn double_press(&self) -> Duration {
        Duration::from_millis(self.double_press_ms)
    }
}

/// UI preferences configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UiConfig {
    /// Theme mode preference (Auto, Dark, Light)
    #[serde(default)]
    pub theme_mode: ThemeMode,
    /// Re-read switch state written by other sessions
    #[serde(default)]
    pub live_sync: bool,
}

/// Menu catalog source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MenusConfig {
    /// Catalog JSON replacing the bundled one
    pub catalog: Option<PathBuf>,
}

/// Contacts added to order notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NotificationsConfig {
    /// Notified when a shipment ships from the warehouse
    #[serde(default)]
    pub warehouse_contact: String,
    /// Notified for every other shipment source
    #[serde(default)]
    pub third_party_contact: String,
}

/// Application configuration.
///
/// # File Location
///
/// - Linux: `~/.config/NavUX/config.toml`
/// - macOS: `~/Library/Application Support/NavUX/config.toml`
/// - Windows: `%APPDATA%\NavUX\config.toml`
///
/// # Validation
///
/// - `close_delay_ms` must be positive
/// - `catalog`, when set, must be a readable file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Persistent store
    #[serde(default)]
    pub storage: StorageConfig,
    /// Hover and keyboard timing
    #[serde(default)]
    pub timing: TimingConfig,
    /// UI preferences
    #[serde(default)]
    pub ui: UiConfig,
    /// Menu catalog
    #[serde(default)]
    pub menus: MenusConfig,
    /// Order notification contacts
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if the config file exists on disk.
    #[must_use]
    pub fn exists() -> bool {
        Self::config_file_path()
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// Gets the platform-specific config directory path.
    ///
    /// `NAVUX_CONFIG_DIR` overrides the platform default.
    pub fn config_dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(dir));
        }

        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_NAME);

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the config file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Loads configuration from `config_path`; a missing file yields defaults.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(config_path).context(format!(
            "Failed to read config file: {}",
            config_path.display()
        ))?;

        let config: Self = toml::from_str(&content).context(format!(
            "Failed to parse config file: {}",
            config_path.display()
        ))?;

        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to the config file using atomic write.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Saves configuration to `config_path`.
    ///
    /// Uses temp file + rename pattern for atomic writes.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(config_dir) = config_path.parent() {
            fs::create_dir_all(config_dir).context(format!(
                "Failed to create config directory: {}",
                config_dir.display()
            ))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        let temp_path = config_path.with_extension("toml.tmp");

        fs::write(&temp_path, content).context(format!(
            "Failed to write temp config file: {}",
            temp_path.display()
        ))?;

        fs::rename(&temp_path, config_path).context(format!(
            "Failed to rename temp config file to: {}",
            config_path.display()
        ))?;

        Ok(())
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.timing.close_delay_ms == 0 {
            anyhow::bail!("timing.close_delay_ms must be greater than zero");
        }

        if let Some(catalog) = &self.menus.catalog {
            if !catalog.is_file() {
                anyhow::bail!("Menu catalog is not a readable file: {}", catalog.display());
            }
        }

        Ok(())
    }

    /// Store file, falling back to `store.json` in the config directory.
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.storage.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("store.json")),
        }
    }

    /// The configured catalog, or the bundled one.
    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.menus.catalog {
            Some(path) => Catalog::from_path(path),
            None => Catalog::builtin(),
        }
    }

    /// Notification contacts for the order review.
    #[must_use]
    pub fn notification_contacts(&self) -> NotificationContacts {
        NotificationContacts {
            warehouse: self.notifications.warehouse_contact.clone(),
            third_party: self.notifications.third_party_contact.clone(),
        }
    }
}
