//! Persistence of the log document.
//!
//! # Data Flow
//! ```text
//! Submission (from collector)
//!     → log_store.rs (lock, read, insert under timestamp, rewrite)
//!     → storage/data.json
//! ```
//!
//! # Design Decisions
//! - The whole document is read and rewritten on every append
//! - An exclusive lock on `<file>.lock` serializes writers across processes
//! - Writes go to a temp file that is renamed over the document

pub mod log_store;
pub mod timestamp;

pub use log_store::{LogDocument, LogStore, StoreError};
