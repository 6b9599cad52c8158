//! Menu rendering and catalog checks.

use clap::Args;
use serde::Serialize;

use crate::cli::common::{print_json, CliError, CliResult};
use crate::config::Config;
use crate::dom::Document;
use crate::menu::{render_menu, Catalog};
use crate::shell::NavShell;

fn load_catalog(config: &Config) -> CliResult<Catalog> {
    config
        .load_catalog()
        .map_err(|e| CliError::io(format!("Failed to load menu catalog: {e:#}")))
}

/// Print the HTML of one menu
#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Menu key (e.g. processing, shipping)
    #[arg(value_name = "MENU")]
    pub menu: String,

    /// Print the whole page with stored switches applied instead
    #[arg(long)]
    pub page: bool,
}

impl RenderArgs {
    /// Execute the render command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        if self.page {
            let shell = NavShell::from_config(config)
                .map_err(|e| CliError::io(format!("Failed to build page: {e:#}")))?;
            if crate::menu::menu_host(shell.document(), &self.menu).is_none() {
                return Err(CliError::validation(format!("Unknown menu: {}", self.menu)));
            }
            println!("{}", shell.html());
            return Ok(());
        }

        let catalog = load_catalog(config)?;
        let html = render_menu_html(&catalog, &self.menu)
            .ok_or_else(|| CliError::validation(format!("Unknown menu: {}", self.menu)))?;
        println!("{html}");
        Ok(())
    }
}

/// Renders menu `key` into a detached host and returns its inner HTML.
#[must_use]
pub fn render_menu_html(catalog: &Catalog, key: &str) -> Option<String> {
    let def = catalog.menu(key)?;
    let mut doc = Document::new();
    let host = doc.create_element_with_class("div", "submenu");
    doc.set_attr(host, "id", &format!("menu-{key}"));
    let body = doc.body();
    doc.append_child(body, host);
    render_menu(&mut doc, host, &catalog.resolve(&def.items));
    Some(doc.inner_html(host))
}

/// Check the menu catalog for dangling icon and href keys
#[derive(Debug, Clone, Args)]
pub struct CheckMenusArgs {
    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct CheckResponse {
    valid: bool,
    menus: usize,
    issues: Vec<String>,
}

impl CheckMenusArgs {
    /// Execute the check-menus command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let catalog = load_catalog(config)?;
        let issues: Vec<String> = catalog.validate().iter().map(ToString::to_string).collect();
        let response = CheckResponse {
            valid: issues.is_empty(),
            menus: catalog.menus.len(),
            issues,
        };

        if self.json {
            print_json(&response)?;
        } else if response.valid {
            println!("✓ {} menus, no issues", response.menus);
        } else {
            println!("✗ {} issue(s) in {} menus", response.issues.len(), response.menus);
            for issue in &response.issues {
                println!("  ✗ {issue}");
            }
        }

        if response.valid {
            Ok(())
        } else {
            Err(CliError::validation("Menu catalog has issues"))
        }
    }
}
