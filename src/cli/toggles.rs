//! Settings switch commands.

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::common::{open_storage, parse_switch_value, print_json, CliError, CliResult};
use crate::config::Config;
use crate::settings::{default_items, Extras, ToggleBus, EXTRA_TOGGLES};
use crate::storage::Storage;

/// Inspect and change persisted settings switches
#[derive(Debug, Clone, Args)]
pub struct TogglesArgs {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: TogglesCommand,
}

/// Switch subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum TogglesCommand {
    /// List every switch and extra toggle
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one value
    Get {
        /// Switch key (s1..s7) or extra toggle id
        key: String,
    },
    /// Set one value as if flipped in the settings panel
    Set {
        /// Switch key (s1..s7) or extra toggle id
        key: String,
        /// on/off
        #[arg(value_parser = parse_switch_value, action = clap::ArgAction::Set)]
        value: bool,
    },
}

#[derive(Debug, Serialize)]
struct ToggleRow {
    key: String,
    label: String,
    value: bool,
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn rows(storage: &Storage) -> Vec<ToggleRow> {
    let bus = ToggleBus::load(storage.clone(), default_items());
    let extras = Extras::load(storage.clone());

    let switches = bus.list().into_iter().map(|e| ToggleRow {
        key: e.key,
        label: e.label,
        value: e.value,
    });
    let extra_rows = EXTRA_TOGGLES.iter().map(|t| ToggleRow {
        key: t.id.to_string(),
        label: t.tooltip.to_string(),
        value: extras.get(t.id),
    });
    switches.chain(extra_rows).collect()
}

/// Sets a switch or extra toggle. Returns `None` for unknown keys.
pub fn set_value(storage: &Storage, key: &str, value: bool) -> Option<bool> {
    let mut bus = ToggleBus::load(storage.clone(), default_items());
    if let Some(change) = bus.user_flip(key, value) {
        return Some(change.value);
    }
    Extras::load(storage.clone()).set(key, value).map(|c| c.value)
}

impl TogglesArgs {
    /// Execute the toggles command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let storage = open_storage(config)?;

        match &self.command {
            TogglesCommand::List { json } => {
                let rows = rows(&storage);
                if *json {
                    print_json(&rows)?;
                } else {
                    for row in &rows {
                        println!("{:<16} {:<4} {}", row.key, on_off(row.value), row.label);
                    }
                }
            }
            TogglesCommand::Get { key } => {
                let row = rows(&storage)
                    .into_iter()
                    .find(|r| r.key == *key)
                    .ok_or_else(|| CliError::validation(format!("Unknown switch: {key}")))?;
                println!("{}", on_off(row.value));
            }
            TogglesCommand::Set { key, value } => {
                set_value(&storage, key, *value)
                    .ok_or_else(|| CliError::validation(format!("Unknown switch: {key}")))?;
                tracing::info!("Switch {} set to {}", key, value);
                println!("{key} = {}", on_off(*value));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_cover_switches_and_extras() {
        let storage = Storage::in_memory();
        let rows = rows(&storage);
        assert_eq!(rows.len(), default_items().len() + EXTRA_TOGGLES.len());
        assert!(rows.iter().any(|r| r.key == "s5"));
        assert!(rows.iter().any(|r| r.key == "extra-toggle-1" && !r.value));
    }

    #[test]
    fn test_set_value_persists() {
        let storage = Storage::in_memory();
        assert_eq!(set_value(&storage, "s5", false), Some(false));
        assert_eq!(set_value(&storage, "extra-toggle-2", true), Some(true));
        assert_eq!(set_value(&storage, "bogus", true), None);

        let reloaded = rows(&storage);
        assert!(reloaded.iter().any(|r| r.key == "s5" && !r.value));
        assert!(reloaded.iter().any(|r| r.key == "extra-toggle-2" && r.value));
    }
}
