//! Contact Book CLI Entry Point
//!
//! With no subcommand the interactive menu runs against the resolved connection.
//! Subcommands:
//! - `run` - Same as no subcommand
//! - `connect` - Save a named connection profile
//! - `connections` - List saved connection profiles
//!
//! Menu output goes to stdout. Logs go to stderr.

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use contact_book::config::{self, ConfigLocation, ConnectionOverrides, StoredConnection};
use contact_book::{ContactRepository, DatabaseType, Menu, TerminalConsole};

/// Environment variable consulted before prompting for a `PostgreSQL` password
const PASSWORD_ENV: &str = "PGPASSWORD";

/// Contact Book - personal contact manager
#[derive(Parser)]
#[command(name = "contact-book")]
#[command(about = "Keep a personal address book in PostgreSQL or SQLite")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive menu (default)
    Run(RunArgs),

    /// Save a named connection profile
    Connect {
        /// Profile name
        #[arg(long)]
        name: String,

        /// Save to the per-user config instead of the current directory
        #[arg(long)]
        global: bool,

        /// Environment variable holding the password
        #[arg(long)]
        password_env: Option<String>,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// List saved connection profiles
    Connections,
}

#[derive(Args, Debug, Clone, Default)]
struct RunArgs {
    /// Named connection profile (defaults to the configured default)
    #[arg(long, short = 'c')]
    connection: Option<String>,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args, Debug, Clone, Default)]
struct EngineArgs {
    /// Database engine
    #[arg(long, value_enum)]
    engine: Option<DatabaseType>,

    /// PostgreSQL host
    #[arg(long)]
    host: Option<String>,

    /// PostgreSQL port
    #[arg(long)]
    port: Option<u16>,

    /// PostgreSQL user
    #[arg(long)]
    user: Option<String>,

    /// PostgreSQL database name
    #[arg(long)]
    database: Option<String>,

    /// SQLite database file
    #[arg(long)]
    file: Option<PathBuf>,
}

impl From<EngineArgs> for ConnectionOverrides {
    fn from(args: EngineArgs) -> Self {
        Self {
            engine: args.engine,
            host: args.host,
            port: args.port,
            user: args.user,
            database: args.database,
            file: args.file,
        }
    }
}

fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .compact()
        .try_init()
        .map_err(|e| anyhow!(e))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.debug) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let result = match cli.command {
        None => run_menu(cli.run).await,
        Some(Commands::Run(args)) => run_menu(args).await,
        Some(Commands::Connect { name, global, password_env, engine }) => {
            save_profile(&name, global, password_env, engine.into())
        }
        Some(Commands::Connections) => list_profiles(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run_menu(args: RunArgs) -> anyhow::Result<()> {
    let merged = config::load_with_precedence()?;
    let overrides = ConnectionOverrides::from(args.engine);
    let mut conn_config =
        config::resolve_with_overrides(&merged, args.connection.as_deref(), &overrides)?;

    if conn_config.needs_password() {
        let password = match std::env::var(PASSWORD_ENV) {
            Ok(password) => password,
            Err(_) => TerminalConsole::new().password("PostgreSQL password")?,
        };
        conn_config.password = Some(password);
    }

    let repo = ContactRepository::new(conn_config);
    debug!(connection = %repo.config().describe(), "resolved connection");

    repo.ensure_schema().await.context("Database setup failed")?;

    let mut menu = Menu::new(repo, TerminalConsole::new());
    menu.run().await?;
    Ok(())
}

fn save_profile(
    name: &str,
    global: bool,
    password_env: Option<String>,
    overrides: ConnectionOverrides,
) -> anyhow::Result<()> {
    let conn_config = overrides.apply(None)?;
    let mut stored = StoredConnection::new(conn_config);
    stored.password_env = password_env;

    let location = if global { ConfigLocation::Global } else { ConfigLocation::Local };
    let path = config::save_connection(name, stored, location)
        .with_context(|| format!("Could not save connection '{name}'"))?;

    println!("Saved connection '{name}' to {}", path.display());
    Ok(())
}

fn list_profiles() -> anyhow::Result<()> {
    let connections = config::list_connections()?;
    if connections.is_empty() {
        println!("No saved connections.");
        return Ok(());
    }

    for (name, conn_config, is_default) in connections {
        let marker = if is_default { " (default)" } else { "" };
        println!("{name:<16} {}{marker}", conn_config.describe());
    }
    Ok(())
}
