//! Hotbutton customization commands.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::common::{open_storage, print_json, CliError, CliResult};
use crate::config::Config;
use crate::constants::DEFAULT_HOTBUTTONS;
use crate::hotbutton::{clear_config, load_config, normalize_svg_input, store_config};

/// Show or change saved hotbutton icons, links and labels
#[derive(Debug, Clone, Args)]
pub struct HotbuttonArgs {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: HotbuttonCommand,
}

/// Hotbutton subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum HotbuttonCommand {
    /// Print the saved config
    Show {
        /// Button key (hb1, hb2, hb3)
        key: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sanitize and save a config
    Set {
        /// Button key (hb1, hb2, hb3)
        key: String,
        /// SVG markup
        #[arg(long, conflicts_with = "svg_file")]
        svg: Option<String>,
        /// File containing SVG markup
        #[arg(long, value_name = "FILE")]
        svg_file: Option<PathBuf>,
        /// Link destination
        #[arg(long, default_value = "")]
        href: String,
        /// Label override
        #[arg(long, default_value = "")]
        label: String,
    },
    /// Remove the saved config
    Clear {
        /// Button key (hb1, hb2, hb3)
        key: String,
    },
}

fn check_key(key: &str) -> CliResult<()> {
    if DEFAULT_HOTBUTTONS.contains(&key) {
        Ok(())
    } else {
        Err(CliError::validation(format!(
            "Unknown hotbutton '{key}' (expected one of: {})",
            DEFAULT_HOTBUTTONS.join(", ")
        )))
    }
}

impl HotbuttonArgs {
    /// Execute the hotbutton command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let storage = open_storage(config)?;

        match &self.command {
            HotbuttonCommand::Show { key, json } => {
                check_key(key)?;
                let saved = load_config(&storage, key);
                if *json {
                    print_json(&saved)?;
                } else if let Some(cfg) = saved {
                    println!("Label: {}", cfg.label);
                    println!("Link:  {}", cfg.href);
                    println!("Icon:  {}", cfg.svg.as_deref().unwrap_or("(default)"));
                } else {
                    println!("{key}: defaults");
                }
            }
            HotbuttonCommand::Set {
                key,
                svg,
                svg_file,
                href,
                label,
            } => {
                check_key(key)?;
                let raw = match (svg, svg_file) {
                    (Some(svg), _) => svg.clone(),
                    (None, Some(path)) => fs::read_to_string(path).map_err(|e| {
                        CliError::io(format!("Failed to read {}: {e}", path.display()))
                    })?,
                    (None, None) => String::new(),
                };
                let svg = normalize_svg_input(&raw);
                match store_config(&storage, key, &svg, href, label) {
                    Ok(Some(_)) => println!("✓ Saved {key}"),
                    Ok(None) => println!("✓ Reset {key} to defaults"),
                    Err(e) => {
                        return Err(CliError::validation(format!("{} ({e})", e.user_message())));
                    }
                }
            }
            HotbuttonCommand::Clear { key } => {
                check_key(key)?;
                clear_config(&storage, key);
                println!("✓ Reset {key} to defaults");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_key() {
        assert!(check_key("hb1").is_ok());
        assert!(check_key("hb3").is_ok());
        let err = check_key("hb9").unwrap_err();
        assert!(err.message.contains("hb1, hb2, hb3"));
    }
}
