//! Text scans for URLs embedded in CSS and meta-refresh values.
//!
//! Only the `url()` functional form, the `@import "<ref>"` rule head and the
//! `<delay>;url=<ref>` refresh value are recognized. Anything that does not
//! match is left exactly as it was.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::resolver::{is_data_uri, BaseOrigin, UrlResolver};

static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^\s"'()]*))\s*\)"#)
        .expect("CSS url() pattern is valid")
});

static CSS_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)@import\s+(?:"([^"]*)"|'([^']*)')"#).expect("@import pattern is valid")
});

static META_REFRESH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(\s*\d+(?:\.\d*)?\s*[;,]\s*url\s*=\s*)(.*)$")
        .expect("meta refresh pattern is valid")
});

/// First participating group among the alternatives of a pattern.
fn reference<'t>(caps: &Captures<'t>) -> &'t str {
    (1..caps.len())
        .find_map(|i| caps.get(i))
        .map_or("", |m| m.as_str())
}

/// Rewrite every `url(...)` token to `url("<proxied>")`.
///
/// `data:` arguments and already proxied ones keep their original token.
pub fn rewrite_css_urls<'a>(css: &'a str, base: &BaseOrigin, resolver: &UrlResolver) -> Cow<'a, str> {
    CSS_URL.replace_all(css, |caps: &Captures<'_>| {
        let original = &caps[0];
        let target = reference(caps);

        if is_data_uri(target) || resolver.is_proxied(target) {
            return original.to_string();
        }

        match resolver.resolve(target, base) {
            Cow::Owned(proxied) => format!("url(\"{proxied}\")"),
            Cow::Borrowed(_) => original.to_string(),
        }
    })
}

/// Rewrite quoted `@import` rule heads, keeping the `@import "..."` shape.
pub fn rewrite_css_imports<'a>(css: &'a str, base: &BaseOrigin, resolver: &UrlResolver) -> Cow<'a, str> {
    CSS_IMPORT.replace_all(css, |caps: &Captures<'_>| {
        let original = &caps[0];
        let target = reference(caps);

        if is_data_uri(target) {
            return original.to_string();
        }

        match resolver.resolve(target, base) {
            Cow::Owned(proxied) => format!("@import \"{proxied}\""),
            Cow::Borrowed(_) => original.to_string(),
        }
    })
}

/// Rewrite the text of a `<style>` block: `url()` tokens, then `@import` heads.
pub fn rewrite_stylesheet<'a>(css: &'a str, base: &BaseOrigin, resolver: &UrlResolver) -> Cow<'a, str> {
    let with_urls = rewrite_css_urls(css, base, resolver);
    let with_imports = match rewrite_css_imports(&with_urls, base, resolver) {
        Cow::Owned(rewritten) => Some(rewritten),
        Cow::Borrowed(_) => None,
    };

    match with_imports {
        Some(rewritten) => Cow::Owned(rewritten),
        None => with_urls,
    }
}

/// Rewrite the URL part of a `<delay>;url=<ref>` refresh value.
///
/// Returns `None` when the value has no delay, no URL, or nothing to change.
pub fn rewrite_meta_refresh(content: &str, base: &BaseOrigin, resolver: &UrlResolver) -> Option<String> {
    let caps = META_REFRESH.captures(content)?;
    let prefix = caps.get(1)?.as_str();
    let target = caps.get(2)?.as_str().trim_end();

    let (quote, target) = match target.chars().next() {
        Some(q @ ('"' | '\'')) if target.len() >= 2 && target.ends_with(q) => {
            (&target[..1], &target[1..target.len() - 1])
        }
        _ => ("", target),
    };

    match resolver.resolve(target, base) {
        Cow::Owned(proxied) => Some(format!("{prefix}{quote}{proxied}{quote}")),
        Cow::Borrowed(_) => None,
    }
}
