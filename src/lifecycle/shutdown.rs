//! Shutdown coordination between the front door and the collector.

use std::sync::Arc;

use tokio::sync::watch;

/// Shutdown flag shared by both listener loops.
///
/// The flag is sticky: a loop that subscribes after `trigger` still sees it
/// set. Dropping every `Shutdown` clone also releases every waiter.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Tell every loop, subscribed now or later, to stop.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Loops still holding a receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once shutdown was triggered or the sender is gone.
pub async fn wait(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|triggered| *triggered).await;
}
