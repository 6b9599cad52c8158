//! NavUX - menubar, settings and hotbutton preview
//!
//! Without a subcommand the navigation shell runs in the terminal; the
//! subcommands give headless access to the same persisted state.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use navux::cli::{CheckMenusArgs, CliError, HotbuttonArgs, RenderArgs, TogglesArgs};
use navux::config::Config;
use navux::constants::{APP_BINARY_NAME, APP_NAME};

/// NavUX - hover-intent menus, settings switches and hotbuttons
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Command to run; the terminal preview when omitted
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the HTML of one menu
    Render(RenderArgs),
    /// Check the menu catalog for dangling keys
    CheckMenus(CheckMenusArgs),
    /// Inspect and change settings switches
    Toggles(TogglesArgs),
    /// Inspect and change hotbuttons
    Hotbutton(HotbuttonArgs),
    /// Serve the page and a JSON API over HTTP
    #[cfg(feature = "web")]
    Serve(ServeArgs),
}

/// Web preview server options
#[cfg(feature = "web")]
#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
}

/// Where log lines go.
enum LogTarget {
    Stderr,
    File(PathBuf),
}

fn init_tracing(verbose: bool, default_level: &str, target: LogTarget) -> Result<()> {
    let level = if verbose { "debug" } else { default_level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into());

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
        LogTarget::File(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir).context(format!(
                    "Failed to create log directory: {}",
                    dir.display()
                ))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .context(format!("Failed to open log file: {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .init();
        }
    }
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn exit_with(err: &CliError) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(err.exit_code.code())
}

#[cfg(feature = "ratatui")]
fn run_terminal(config: &Config) -> Result<()> {
    use navux::tui::{restore_terminal, run_tui, setup_terminal, TuiState};

    let shell = navux::NavShell::from_config(config)?;
    let mut state = TuiState::new(shell);

    let mut terminal = setup_terminal()?;
    let result = run_tui(&mut state, &mut terminal);
    restore_terminal(terminal)?;
    result
}

#[cfg(not(feature = "ratatui"))]
fn run_terminal(_config: &Config) -> Result<()> {
    anyhow::bail!(
        "{APP_NAME} was built without the terminal preview; run `{APP_BINARY_NAME} --help` for the available commands"
    )
}

#[cfg(feature = "web")]
fn serve(config: Config, args: &ServeArgs) -> Result<()> {
    let addr: std::net::SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("Invalid host/port combination")?;

    println!("{} v{} preview on http://{addr}/nav", APP_NAME, env!("CARGO_PKG_VERSION"));

    tokio::runtime::Runtime::new()
        .context("Failed to start async runtime")?
        .block_on(navux::web::run_server(config, addr))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            eprintln!();
            eprintln!("Fix or remove the config file, or point to another with:");
            eprintln!("  {APP_BINARY_NAME} --config path/to/config.toml");
            std::process::exit(1);
        }
    };

    let Some(command) = cli.command else {
        let log_path = Config::config_dir()?.join(format!("{APP_BINARY_NAME}.log"));
        init_tracing(cli.verbose, "info", LogTarget::File(log_path))?;
        return run_terminal(&config);
    };

    let level = match &command {
        #[cfg(feature = "web")]
        Command::Serve(_) => "info",
        _ => "warn",
    };
    init_tracing(cli.verbose, level, LogTarget::Stderr)?;

    let result = match command {
        Command::Render(args) => args.execute(&config),
        Command::CheckMenus(args) => args.execute(&config),
        Command::Toggles(args) => args.execute(&config),
        Command::Hotbutton(args) => args.execute(&config),
        #[cfg(feature = "web")]
        Command::Serve(args) => return serve(config, &args),
    };

    if let Err(err) = result {
        exit_with(&err);
    }
    Ok(())
}
