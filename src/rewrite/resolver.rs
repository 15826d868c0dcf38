//! URL resolution and proxy wrapping.
//!
//! # Responsibilities
//! - Classify a reference's scheme (opaque vs. rewritable)
//! - Resolve relative references against the fetched document's URL
//! - Wrap absolute URLs into the proxy's own `<path>?url=<encoded>` form
//! - Recognize already-proxied references so rewriting is idempotent
//!
//! # Design Decisions
//! - Pure functions, no I/O
//! - Failure to resolve is never an error: the reference is returned as-is
//! - Encoding matches `encodeURIComponent` so the proxied value is one query component

use std::borrow::Cow;
use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Default path the proxy endpoint is mounted on.
pub const DEFAULT_PROXY_PATH: &str = "/proxy";

/// Schemes whose references are never rewritten.
const OPAQUE_SCHEMES: &[&str] = &["data:", "blob:", "mailto:", "tel:", "javascript:"];

/// Everything except the unreserved marks `encodeURIComponent` leaves alone.
const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Classification of a reference's URI scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeClass {
    /// `data:`, `blob:`, `mailto:`, `tel:`, `javascript:`.
    Opaque,
    /// Relative references and absolute http(s) URLs.
    Rewritable,
}

impl SchemeClass {
    /// Classify a reference by its scheme prefix (case-insensitive).
    pub fn of(reference: &str) -> Self {
        let trimmed = reference.trim_start();
        let opaque = OPAQUE_SCHEMES.iter().any(|scheme| {
            trimmed
                .get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
        });

        if opaque {
            SchemeClass::Opaque
        } else {
            SchemeClass::Rewritable
        }
    }
}

/// Returns true if the reference is a `data:` URI.
pub fn is_data_uri(reference: &str) -> bool {
    reference
        .trim_start()
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"))
}

/// The URL of the document being rewritten.
///
/// Derived once per request from the URL actually fetched (after redirects)
/// and never from an in-document `<base>` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseOrigin {
    url: Url,
}

impl BaseOrigin {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        Url::parse(input).map(Self::new)
    }

    /// `scheme://host[:port]` of the document.
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Resolve a reference using standard relative-URL semantics.
    pub fn join(&self, reference: &str) -> Result<Url, url::ParseError> {
        self.url.join(reference)
    }
}

impl fmt::Display for BaseOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Turns references found in a document into proxied URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResolver {
    proxy_path: String,
}

impl UrlResolver {
    /// Create a resolver emitting `<proxy_path>?url=...`.
    pub fn new(proxy_path: impl Into<String>) -> Self {
        Self {
            proxy_path: proxy_path.into(),
        }
    }

    pub fn proxy_path(&self) -> &str {
        &self.proxy_path
    }

    /// Returns true if the reference already points back through this proxy.
    pub fn is_proxied(&self, reference: &str) -> bool {
        reference
            .trim()
            .strip_prefix(self.proxy_path.as_str())
            .and_then(|rest| rest.strip_prefix('?'))
            .is_some_and(|query| query.split('&').any(|pair| pair.starts_with("url=")))
    }

    /// Wrap an absolute URL into the proxied form.
    pub fn proxied(&self, target: &Url) -> String {
        format!(
            "{}?url={}",
            self.proxy_path,
            utf8_percent_encode(target.as_str(), URL_COMPONENT)
        )
    }

    /// Resolve a reference against `base` and wrap it.
    ///
    /// Returns `Cow::Borrowed` with the untouched input whenever the reference
    /// must not or cannot be rewritten.
    pub fn resolve<'a>(&self, reference: &'a str, base: &BaseOrigin) -> Cow<'a, str> {
        if reference.trim().is_empty()
            || SchemeClass::of(reference) == SchemeClass::Opaque
            || self.is_proxied(reference)
        {
            return Cow::Borrowed(reference);
        }

        match base.join(reference) {
            Ok(absolute) if matches!(absolute.scheme(), "http" | "https") => {
                Cow::Owned(self.proxied(&absolute))
            }
            Ok(absolute) => {
                tracing::trace!(
                    reference = %reference,
                    scheme = %absolute.scheme(),
                    "Leaving non-http reference untouched"
                );
                Cow::Borrowed(reference)
            }
            Err(e) => {
                tracing::debug!(
                    reference = %reference,
                    base = %base,
                    error = %e,
                    "Leaving unresolvable reference untouched"
                );
                Cow::Borrowed(reference)
            }
        }
    }
}

impl Default for UrlResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PROXY_PATH)
    }
}
