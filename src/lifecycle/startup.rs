//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics endpoint when enabled
//! - Bind the collector before the front door so early submissions land
//! - Run the selected loops until shutdown or the first failure
//!
//! # Design Decisions
//! - Fail fast: any bind error is fatal
//! - When one loop ends, the other is told to shut down

use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::collector::{Collector, CollectorError};
use crate::config::RelayConfig;
use crate::http::{Forwarder, HttpServer};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::storage::LogStore;

/// Which loops this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Front door and collector in one process.
    All,
    FrontDoor,
    Collector,
}

impl Role {
    fn runs_front_door(self) -> bool {
        matches!(self, Role::All | Role::FrontDoor)
    }

    fn runs_collector(self) -> bool {
        matches!(self, Role::All | Role::Collector)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind front door on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid collector address '{0}'")]
    CollectorAddress(String),

    #[error("failed to open forwarding socket: {0}")]
    Forwarder(#[source] io::Error),

    #[error("front door failed: {0}")]
    Serve(#[source] io::Error),

    #[error(transparent)]
    Collector(#[from] CollectorError),

    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Loops started by [`start`].
pub struct Running {
    pub front_door_addr: Option<SocketAddr>,
    pub collector_addr: Option<SocketAddr>,
    tasks: JoinSet<Result<(), StartupError>>,
}

impl Running {
    /// Wait for every loop to finish. The first loop to end triggers
    /// `shutdown` for the rest; the first error is returned.
    pub async fn wait(mut self, shutdown: &Shutdown) -> Result<(), StartupError> {
        let mut result = Ok(());
        while let Some(joined) = self.tasks.join_next().await {
            shutdown.trigger();
            if let Err(e) = joined.map_err(StartupError::from).and_then(|r| r) {
                tracing::error!(error = %e, "Loop terminated with error");
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }
}

/// Bind and spawn the loops for `role`.
pub async fn start(
    config: &RelayConfig,
    role: Role,
    shutdown: &Shutdown,
) -> Result<Running, StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut tasks = JoinSet::new();
    let mut running_collector = None;

    if role.runs_collector() {
        let store = LogStore::new(&config.storage.path);
        let collector = Collector::bind(&config.collector, store).await?;
        let addr = collector.local_addr().map_err(CollectorError::Receive)?;
        running_collector = Some(addr);

        let rx = shutdown.subscribe();
        tasks.spawn(async move { collector.run(rx).await.map_err(StartupError::from) });
    }

    let mut front_door_addr = None;
    if role.runs_front_door() {
        let target = forward_target(config, running_collector)?;
        let forwarder = Forwarder::bind(target)
            .await
            .map_err(StartupError::Forwarder)?;

        let listener = TcpListener::bind(&config.front_door.bind_address)
            .await
            .map_err(|source| StartupError::Bind {
                addr: config.front_door.bind_address.clone(),
                source,
            })?;
        front_door_addr = Some(listener.local_addr().map_err(StartupError::Serve)?);

        let server = HttpServer::new(config, forwarder);
        let rx = shutdown.subscribe();
        tasks.spawn(async move { server.run(listener, rx).await.map_err(StartupError::Serve) });
    }

    Ok(Running {
        front_door_addr,
        collector_addr: running_collector,
        tasks,
    })
}

/// Start the loops for `role` and run them to completion.
pub async fn run(config: RelayConfig, role: Role, shutdown: Shutdown) -> Result<(), StartupError> {
    start(&config, role, &shutdown).await?.wait(&shutdown).await
}

/// Where the front door sends datagrams.
///
/// A collector in the same process that was bound to port 0 is reached at
/// its actual address; otherwise the configured address is used.
fn forward_target(
    config: &RelayConfig,
    local_collector: Option<SocketAddr>,
) -> Result<SocketAddr, StartupError> {
    let configured_port_zero = config
        .collector
        .bind_address
        .parse::<SocketAddr>()
        .map(|a| a.port() == 0)
        .unwrap_or(false);

    match local_collector {
        Some(addr) if configured_port_zero => Ok(addr),
        _ => config
            .front_door
            .collector_address
            .parse()
            .map_err(|_| StartupError::CollectorAddress(config.front_door.collector_address.clone())),
    }
}
