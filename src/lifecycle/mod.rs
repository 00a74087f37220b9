//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → bind collector → bind front door → spawn loops
//!
//! Shutdown (shutdown.rs):
//!     Signal received → front door stops accepting and drains
//!                     → collector finishes the datagram in hand
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{Role, Running, StartupError};
