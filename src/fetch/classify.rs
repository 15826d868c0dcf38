//! Media type classification.

/// How a fetched body is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    /// Parsed and rewritten.
    Html,
    /// Passed through byte-for-byte.
    Opaque,
}

/// HTML iff the declared media type contains `text/html` (case-insensitive).
pub fn classify(media_type: &str) -> ContentClass {
    if media_type.to_ascii_lowercase().contains("text/html") {
        ContentClass::Html
    } else {
        ContentClass::Opaque
    }
}
