//! Web form relay: an HTTP front door that forwards form bodies over UDP to
//! a collector, which appends them to a timestamped JSON log.

pub mod collector;
pub mod config;
pub mod form;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod storage;

pub use collector::Collector;
pub use config::RelayConfig;
pub use form::Submission;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use storage::LogStore;
