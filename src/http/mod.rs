//! HTTP-facing front door.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, routes)
//!     → GET: pages.rs (fixed pages, static files, error page)
//!     → POST: forward.rs (body → one UDP datagram to the collector)
//!     → 302 Location: /
//! ```

pub mod error;
pub mod forward;
pub mod pages;
pub mod server;

pub use error::FrontDoorError;
pub use forward::Forwarder;
pub use pages::StaticFiles;
pub use server::HttpServer;
