//! Application-wide constants.
//!
//! This module defines the application name, default hover-intent timings and
//! the fixed storage keys shared between the front-end components.

use std::time::Duration;

/// The display name of the application (human-readable, with proper capitalization).
pub const APP_NAME: &str = "NavUX";

/// The binary name of the application (used in command examples, lowercase).
pub const APP_BINARY_NAME: &str = "navux";

/// Delay before a hovered trigger opens its menu.
pub const DEFAULT_OPEN_DELAY: Duration = Duration::from_millis(140);

/// Delay before a left trigger closes its menu.
pub const DEFAULT_CLOSE_DELAY: Duration = Duration::from_millis(270);

/// Window in which two presses of the same key count as a double press.
pub const DOUBLE_PRESS_THRESHOLD: Duration = Duration::from_millis(400);

/// How long a tooltip stays suppressed after its host was activated.
pub const TOOLTIP_REARM: Duration = Duration::from_millis(2400);

/// Persisted settings switches (`{key: bool}`).
pub const SWITCHES_STORAGE_KEY: &str = "st:switches:v1";

/// Persisted extras (`{id: bool}`).
pub const EXTRAS_STORAGE_KEY: &str = "settings:extra:v1";

/// Persisted settings-menu form values (`{values: {...}}`).
pub const SETTINGS_MENU_STORAGE_KEY: &str = "settings:menu";

/// Persisted page theme (plain `light` / `dark`, not JSON).
pub const THEME_STORAGE_KEY: &str = "theme";

/// Prefix for per-button hotbutton configs.
pub const HOTBUTTON_STORAGE_PREFIX: &str = "hotbutton:";

/// Hotbutton keys placed on the bar when a host builds the page itself.
pub const DEFAULT_HOTBUTTONS: [&str; 3] = ["hb1", "hb2", "hb3"];

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "NAVUX_CONFIG_DIR";
