//! Shared error type and helpers for CLI commands.

use std::fmt;

use crate::config::Config;
use crate::storage::{FileStore, Storage};

/// Process exit codes used by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command succeeded
    Success = 0,
    /// Bad input or a failed check
    Validation = 1,
    /// Filesystem or serialization failure
    Io = 2,
}

impl ExitCode {
    /// Numeric code passed to `std::process::exit`.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Error returned by a CLI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    /// Exit code to report
    pub exit_code: ExitCode,
    /// Message printed to stderr
    pub message: String,
}

impl CliError {
    /// Bad arguments or a failed check.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            exit_code: ExitCode::Validation,
            message: message.into(),
        }
    }

    /// Filesystem or serialization failure.
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            exit_code: ExitCode::Io,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Opens the store named by the configuration.
pub fn open_storage(config: &Config) -> CliResult<Storage> {
    let path = config
        .store_path()
        .map_err(|e| CliError::io(format!("Failed to locate store: {e}")))?;
    let store = FileStore::open(&path)
        .map_err(|e| CliError::io(format!("Failed to open store {}: {e:#}", path.display())))?;
    Ok(Storage::new(store))
}

/// Parses `on`/`off` style switch values.
pub fn parse_switch_value(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        other => Err(format!("expected on/off, got '{other}'")),
    }
}

/// Prints `value` as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?;
    println!("{json}");
    Ok(())
}
