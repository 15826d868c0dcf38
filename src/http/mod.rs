//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request ID, trace, timeout, CORS)
//!     → handlers.rs (landing page, health, proxy endpoint)
//!         → fetch (outbound GET) → classify → rewrite | passthrough
//!     → response.rs (content type, cache policy, 400/502 mapping)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::ProxyError;
pub use server::{AppState, HttpServer};
