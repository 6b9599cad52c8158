//! NavUX Library
//!
//! Interaction layer for the order-management front-end: hover-intent
//! menus rendered from a catalog, a settings panel whose persisted switches
//! drive the menubar, customizable hotbuttons, the search scope picker and
//! the order-review form logic.
//!
//! Everything runs on an in-memory document tree driven by explicit events
//! and a virtual clock, so hosts (the terminal preview, the web preview,
//! tests) decide how input and time arrive.

// Module declarations
pub mod bus;
pub mod cli;
pub mod config;
pub mod constants;
pub mod dom;
pub mod expandable;
pub mod hotbutton;
pub mod hover;
pub mod inbox;
pub mod menu;
pub mod order_review;
pub mod search;
pub mod settings;
pub mod shell;
pub mod storage;
pub mod timer;

#[cfg(feature = "ratatui")]
pub mod tui;

#[cfg(feature = "web")]
pub mod web;

pub use config::Config;
pub use shell::{Effect, NavShell, ShellOptions};
pub use storage::{FileStore, KvStore, MemoryStore, Storage};
