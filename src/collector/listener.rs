//! UDP receive loop feeding the log store.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::watch;

use crate::config::CollectorConfig;
use crate::form::{FormError, Submission};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::storage::{LogStore, StoreError};

/// Error type for the collector.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to receive datagram: {0}")]
    Receive(#[source] io::Error),

    #[error("datagram of {len} bytes exceeds the {max} byte limit")]
    Oversized { len: usize, max: usize },

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl CollectorError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bind { .. } => "bind",
            Self::Receive(_) => "receive",
            Self::Oversized { .. } => "oversized",
            Self::Form(_) => "form",
            Self::Store(_) => "store",
            Self::Join(_) => "join",
        }
    }
}

/// Receives form bodies over UDP and appends them to the log document.
pub struct Collector {
    socket: UdpSocket,
    store: LogStore,
    max_datagram_bytes: usize,
}

impl Collector {
    /// Bind the datagram endpoint.
    pub async fn bind(config: &CollectorConfig, store: LogStore) -> Result<Self, CollectorError> {
        let socket = UdpSocket::bind(&config.bind_address)
            .await
            .map_err(|source| CollectorError::Bind {
                addr: config.bind_address.clone(),
                source,
            })?;

        Ok(Self::from_socket(socket, store, config.max_datagram_bytes))
    }

    pub fn from_socket(socket: UdpSocket, store: LogStore, max_datagram_bytes: usize) -> Self {
        Self {
            socket,
            store,
            max_datagram_bytes,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receive until shutdown.
    ///
    /// Per-datagram failures are logged and skipped. Only a socket failure
    /// ends the loop with an error.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<(), CollectorError> {
        let addr = self.local_addr().map_err(CollectorError::Receive)?;
        tracing::info!(
            address = %addr,
            store = %self.store.path().display(),
            max_datagram_bytes = self.max_datagram_bytes,
            "Collector listening"
        );

        // One spare byte tells an exactly-full datagram from an oversized one.
        let mut buf = vec![0u8; self.max_datagram_bytes + 1];
        let stop = shutdown::wait(shutdown);
        tokio::pin!(stop);

        loop {
            tokio::select! {
                _ = &mut stop => break,
                received = self.socket.recv_from(&mut buf) => {
                    let (len, peer) = match received {
                        Ok(r) => r,
                        Err(e) if is_transient(&e) => {
                            tracing::debug!(error = %e, "Ignoring transient receive error");
                            continue;
                        }
                        Err(e) => return Err(CollectorError::Receive(e)),
                    };

                    metrics::record_datagram();
                    match self.handle_datagram(&buf[..len]).await {
                        Ok(timestamp) => {
                            metrics::record_persisted();
                            tracing::debug!(peer = %peer, bytes = len, timestamp = %timestamp, "Entry persisted");
                        }
                        Err(e) => {
                            metrics::record_collector_error(e.kind());
                            tracing::warn!(peer = %peer, bytes = len, error = %e, "Dropping datagram");
                        }
                    }
                }
            }
        }

        tracing::info!("Collector stopped");
        Ok(())
    }

    /// Decode one payload and append it. Returns the timestamp key.
    pub async fn handle_datagram(&self, payload: &[u8]) -> Result<String, CollectorError> {
        if payload.len() > self.max_datagram_bytes {
            return Err(CollectorError::Oversized {
                len: payload.len(),
                max: self.max_datagram_bytes,
            });
        }

        let submission = Submission::from_bytes(payload)?;
        tracing::info!(fields = submission.len(), submission = ?submission, "Submission received");

        let store = self.store.clone();
        let timestamp = tokio::task::spawn_blocking(move || store.append(&submission)).await??;
        Ok(timestamp)
    }
}

/// ICMP "port unreachable" from an earlier send can surface on recv.
fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionRefused | io::ErrorKind::Interrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collector(dir: &tempfile::TempDir, max: usize) -> Collector {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        Collector::from_socket(socket, LogStore::new(dir.path().join("data.json")), max)
    }

    #[tokio::test]
    async fn test_handle_datagram_appends_entry() {
        let dir = tempfile::tempdir().unwrap();
        let collector = collector(&dir, 1024).await;

        let key = collector.handle_datagram(b"name=Ann&age=30").await.unwrap();

        let document = collector.store.load().unwrap();
        assert_eq!(document[&key], serde_json::json!({"name": "Ann", "age": "30"}));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_form_error() {
        let dir = tempfile::tempdir().unwrap();
        let collector = collector(&dir, 1024).await;

        let err = collector.handle_datagram(&[0xc3, 0x28]).await.unwrap_err();
        assert_eq!(err.kind(), "form");
        assert!(collector.store.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_size_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let collector = collector(&dir, 8).await;

        assert!(collector.handle_datagram(b"abcd=efg").await.is_ok());
        let err = collector.handle_datagram(b"abcd=efgh").await.unwrap_err();
        assert!(matches!(err, CollectorError::Oversized { len: 9, max: 8 }));
        assert_eq!(collector.store.load().unwrap().len(), 1);
    }
}
