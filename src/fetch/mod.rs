//! Outbound fetch subsystem.
//!
//! # Data Flow
//! ```text
//! absolute target URL
//!     → client.rs (GET with fixed user agent, redirects ≤ limit, deadline)
//!     → FetchedContent { status, final_url, media_type, cache_control, body }
//!     → classify.rs (HTML → rewrite engine, anything else → passthrough)
//!     → charset.rs (HTML bodies transcoded to UTF-8 before rewriting)
//! ```
//!
//! # Design Decisions
//! - Client headers (cookies, auth) are never forwarded to origins
//! - Status ≥ 500 and every transport problem are a single failure class
//! - No retries; the client decides whether to try again

pub mod charset;
pub mod classify;
pub mod client;

pub use charset::{decode_html, declared_encoding};
pub use classify::{classify, ContentClass};
pub use client::{ContentFetcher, FetchError, FetchedContent};
