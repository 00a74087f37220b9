//! Form relay (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────── form-relay ───────────────────────┐
//!                 │                                                           │
//!   browser ──────┼─▶ front door (axum, :3000) ──UDP──▶ collector (:5000)     │
//!      ▲          │        │ GET: pages, static files        │                │
//!      │          │        │ POST: forward body, 302 → /     ▼                │
//!      └──────────┼────────┘                       storage/data.json          │
//!                 │                              (locked read-modify-write)   │
//!                 └───────────────────────────────────────────────────────────┘
//! ```
//!
//! `serve` runs both loops in this process; `front-door` and `collector` run
//! one loop each, so the two halves can live in separate processes.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use form_relay::config;
use form_relay::lifecycle::{signals, startup, Role, Shutdown};
use form_relay::observability::logging;

#[derive(Parser)]
#[command(name = "form-relay")]
#[command(about = "Web form collector: HTTP front door plus UDP collector", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Run front door and collector together (default)
    Serve,
    /// Run only the HTTP front door
    FrontDoor,
    /// Run only the datagram collector
    Collector,
}

impl From<Commands> for Role {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Serve => Role::All,
            Commands::FrontDoor => Role::FrontDoor,
            Commands::Collector => Role::Collector,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = config::load_or_default(cli.config.as_deref())?;
    logging::init_logging(&config.observability.log_level);

    let role = cli.command.map(Role::from).unwrap_or(Role::All);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        role = ?role,
        front_door = %config.front_door.bind_address,
        collector = %config.collector.bind_address,
        storage = %config.storage.path,
        "form-relay starting"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    startup::run(config, role, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
