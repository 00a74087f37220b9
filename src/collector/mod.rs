//! Datagram-facing collector.
//!
//! # Data Flow
//! ```text
//! UDP datagram (raw form body)
//!     → listener.rs (receive loop, size check)
//!     → form.rs (UTF-8 + form decoding)
//!     → storage (append under capture timestamp)
//! ```
//!
//! # Design Decisions
//! - One datagram at a time; the loop never processes two concurrently
//! - A failing datagram is logged and counted, the loop keeps going
//! - Datagrams above the configured size are dropped, never truncated

pub mod listener;

pub use listener::{Collector, CollectorError};
