//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use form_relay::config::RelayConfig;
use form_relay::lifecycle::{startup, Role, Running, Shutdown, StartupError};
use form_relay::storage::{LogDocument, LogStore};
use tempfile::TempDir;

/// A relay running on ephemeral ports with its own storage directory.
pub struct TestRelay {
    pub http: Option<SocketAddr>,
    pub collector: Option<SocketAddr>,
    pub store: LogStore,
    shutdown: Shutdown,
    running: Running,
    _dir: TempDir,
}

#[allow(dead_code)]
impl TestRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.http.expect("front door not running"), path)
    }

    /// Trigger shutdown and wait for every loop to exit.
    pub async fn stop(self) -> Result<(), StartupError> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.running.wait(&self.shutdown))
            .await
            .expect("relay did not shut down in time")
    }
}

/// Pages shipped with the crate.
pub fn static_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static")
}

/// Base config bound to loopback ephemeral ports.
pub fn test_config(dir: &TempDir) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.front_door.bind_address = "127.0.0.1:0".into();
    config.front_door.static_dir = static_dir().display().to_string();
    config.collector.bind_address = "127.0.0.1:0".into();
    config.storage.path = dir.path().join("storage").join("data.json").display().to_string();
    config
}

/// Start front door and collector in this process.
#[allow(dead_code)]
pub async fn start_relay() -> TestRelay {
    start_with(Role::All, |_| {}).await
}

/// Start the given role after letting the caller adjust the config.
pub async fn start_with(role: Role, adjust: impl FnOnce(&mut RelayConfig)) -> TestRelay {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    adjust(&mut config);

    let shutdown = Shutdown::new();
    let running = startup::start(&config, role, &shutdown).await.unwrap();

    TestRelay {
        http: running.front_door_addr,
        collector: running.collector_addr,
        store: LogStore::new(&config.storage.path),
        shutdown,
        running,
        _dir: dir,
    }
}

/// HTTP client that neither follows redirects nor uses a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll the store until it holds at least `count` entries.
#[allow(dead_code)]
pub async fn wait_for_entries(store: &LogStore, count: usize) -> LogDocument {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let document = store.load().unwrap();
        if document.len() >= count {
            return document;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("expected {count} entries, found {}", document.len());
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
