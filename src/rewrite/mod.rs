//! URL rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! fetched HTML bytes + final URL
//!     → resolver.rs (BaseOrigin, scheme classification, proxied form)
//!     → engine.rs (attribute, inline CSS, @import, meta-refresh, base passes)
//!         → css.rs (url() / @import / refresh text scans)
//!         → entities.rs (attribute value decoding)
//!     → rewritten bytes, ready to serve
//! ```
//!
//! # Design Decisions
//! - Every pass degrades to "leave it as it was" instead of failing
//! - Already-proxied references are detected and skipped
//! - Base origin comes from the fetched URL, never from `<base href>`

pub mod css;
pub mod engine;
pub mod entities;
pub mod resolver;

pub use engine::{Document, ElementKind, RewriteEngine};
pub use resolver::{BaseOrigin, SchemeClass, UrlResolver, DEFAULT_PROXY_PATH};
