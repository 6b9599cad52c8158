//! CLI command handlers.
//!
//! Headless access to the persisted switches, hotbuttons and the menu
//! catalog, for scripting and CI.

pub mod common;
pub mod hotbutton;
pub mod menus;
pub mod toggles;

// Re-export types used by main.rs and tests
pub use common::{CliError, CliResult, ExitCode};
pub use hotbutton::HotbuttonArgs;
pub use menus::{CheckMenusArgs, RenderArgs};
pub use toggles::TogglesArgs;
