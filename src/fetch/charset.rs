//! Character set handling for HTML bodies.
//!
//! Rewritten documents are always served as UTF-8, so bodies declared in
//! any other encoding are transcoded before the rewriter sees them.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};

/// Encoding named by the `charset` parameter of `media_type`, UTF-8 if
/// absent or unknown.
pub fn declared_encoding(media_type: &str) -> &'static Encoding {
    media_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, label)| {
            Encoding::for_label(label.trim().trim_matches(|c| c == '"' || c == '\'').as_bytes())
        })
        .unwrap_or(UTF_8)
}

/// Transcode an HTML body to UTF-8 according to its declared media type.
///
/// A byte order mark takes precedence over the declared label. UTF-8 bodies
/// without one are returned as they are.
pub fn decode_html(body: Vec<u8>, media_type: &str) -> Vec<u8> {
    let declared = declared_encoding(media_type);
    let sniffed = Encoding::for_bom(&body).map(|(encoding, _)| encoding);
    if declared == UTF_8 && sniffed.is_none() {
        return body;
    }

    let (text, used, had_errors) = declared.decode(&body);
    if had_errors {
        tracing::debug!(
            encoding = used.name(),
            "Malformed input replaced while decoding document"
        );
    }
    match text {
        Cow::Owned(text) => text.into_bytes(),
        Cow::Borrowed(text) => text.as_bytes().to_vec(),
    }
}
