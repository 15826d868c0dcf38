//! HTML rewrite engine.
//!
//! Every rewrite pass is registered as a handler on a single streaming
//! rewriter, so the document is tokenized once and re-serialized once.
//! Handlers never fail on bad input: a reference that cannot be resolved
//! keeps its original text.

use std::cell::RefCell;

use lol_html::errors::RewritingError;
use lol_html::html_content::ContentType;
use lol_html::{element, text, HtmlRewriter, Settings};

use super::css::{rewrite_css_urls, rewrite_meta_refresh, rewrite_stylesheet};
use super::entities::decode_attribute;
use super::resolver::{BaseOrigin, UrlResolver};

/// Elements carrying a location attribute that must point back at the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Image,
    Script,
    StylesheetLink,
    Iframe,
    MediaSource,
    Video,
    Audio,
    Embed,
    Object,
    Track,
    Anchor,
    Area,
    Form,
}

impl ElementKind {
    pub const ALL: [ElementKind; 13] = [
        ElementKind::Image,
        ElementKind::Script,
        ElementKind::StylesheetLink,
        ElementKind::Iframe,
        ElementKind::MediaSource,
        ElementKind::Video,
        ElementKind::Audio,
        ElementKind::Embed,
        ElementKind::Object,
        ElementKind::Track,
        ElementKind::Anchor,
        ElementKind::Area,
        ElementKind::Form,
    ];

    pub fn tag_name(self) -> &'static str {
        match self {
            ElementKind::Image => "img",
            ElementKind::Script => "script",
            ElementKind::StylesheetLink => "link",
            ElementKind::Iframe => "iframe",
            ElementKind::MediaSource => "source",
            ElementKind::Video => "video",
            ElementKind::Audio => "audio",
            ElementKind::Embed => "embed",
            ElementKind::Object => "object",
            ElementKind::Track => "track",
            ElementKind::Anchor => "a",
            ElementKind::Area => "area",
            ElementKind::Form => "form",
        }
    }

    /// The attribute holding this element's location.
    pub fn location_attribute(self) -> &'static str {
        match self {
            ElementKind::Form => "action",
            ElementKind::Object => "data",
            ElementKind::Anchor | ElementKind::Area | ElementKind::StylesheetLink => "href",
            _ => "src",
        }
    }

    fn selector(self) -> String {
        format!("{}[{}]", self.tag_name(), self.location_attribute())
    }
}

/// An HTML document owned by one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    html: Vec<u8>,
}

impl Document {
    pub fn from_bytes(html: impl Into<Vec<u8>>) -> Self {
        Self { html: html.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.html
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.html
    }

    pub fn len(&self) -> usize {
        self.html.len()
    }

    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }
}

/// Rewrites every URL occurrence in a document through a [`UrlResolver`].
#[derive(Debug, Clone, Default)]
pub struct RewriteEngine {
    resolver: UrlResolver,
}

impl RewriteEngine {
    pub fn new(resolver: UrlResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &UrlResolver {
        &self.resolver
    }

    /// Rewrite the document in place.
    ///
    /// If the tokenizer gives up, the document is left untouched.
    pub fn rewrite<'d>(&self, document: &'d mut Document, base: &BaseOrigin) -> &'d mut Document {
        match self.rewrite_bytes(document.as_bytes(), base) {
            Ok(html) => {
                tracing::debug!(
                    origin = %base.origin(),
                    bytes_in = document.len(),
                    bytes_out = html.len(),
                    "Document rewritten"
                );
                document.html = html;
            }
            Err(e) => {
                tracing::warn!(
                    origin = %base.origin(),
                    error = %e,
                    "HTML rewriting aborted, serving document unmodified"
                );
            }
        }
        document
    }

    /// New value for a location attribute, or `None` to keep the original.
    fn location(&self, raw: &str, base: &BaseOrigin) -> Option<String> {
        let value = decode_attribute(raw);
        let resolved = self.resolver.resolve(&value, base);
        (*resolved != *value).then(|| resolved.into_owned())
    }

    /// New value for an inline `style` attribute, or `None` to keep the original.
    fn inline_style(&self, raw: &str, base: &BaseOrigin) -> Option<String> {
        let value = decode_attribute(raw);
        let rewritten = rewrite_css_urls(&value, base, &self.resolver);
        (*rewritten != *value).then(|| rewritten.into_owned())
    }

    fn rewrite_bytes(&self, html: &[u8], base: &BaseOrigin) -> Result<Vec<u8>, RewritingError> {
        let style_text = RefCell::new(String::new());
        let mut output = Vec::with_capacity(html.len() + html.len() / 8);

        // Attribute pass: one handler per element kind.
        let mut handlers: Vec<_> = ElementKind::ALL
            .into_iter()
            .map(|kind| {
                let attr = kind.location_attribute();
                element!(kind.selector(), move |el| {
                    if let Some(value) = el.get_attribute(attr) {
                        if let Some(proxied) = self.location(&value, base) {
                            el.set_attribute(attr, &proxied)?;
                        }
                    }
                    Ok(())
                })
            })
            .collect();

        handlers.extend([
            // Inline CSS pass over style attributes.
            element!("[style]", |el| {
                if let Some(value) = el.get_attribute("style") {
                    if let Some(rewritten) = self.inline_style(&value, base) {
                        el.set_attribute("style", &rewritten)?;
                    }
                }
                Ok(())
            }),
            // Meta-refresh pass.
            element!("meta[http-equiv][content]", |el| {
                let is_refresh = el
                    .get_attribute("http-equiv")
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"));
                if !is_refresh {
                    return Ok(());
                }
                if let Some(content) = el.get_attribute("content") {
                    let content = decode_attribute(&content);
                    if let Some(rewritten) = rewrite_meta_refresh(&content, base, &self.resolver) {
                        el.set_attribute("content", &rewritten)?;
                    }
                }
                Ok(())
            }),
            // Base-tag pass. Does not change `base` for the other passes.
            element!("base[href]", |el| {
                if let Some(value) = el.get_attribute("href") {
                    if let Some(proxied) = self.location(&value, base) {
                        el.set_attribute("href", &proxied)?;
                    }
                }
                Ok(())
            }),
            // Inline CSS and @import passes over `<style>` blocks. Text
            // arrives in chunks, so it is buffered and the rewritten
            // stylesheet is substituted as a whole on the last chunk.
            text!("style", |chunk| {
                let mut buffered = style_text.borrow_mut();
                buffered.push_str(chunk.as_str());
                if chunk.last_in_text_node() {
                    let css = std::mem::take(&mut *buffered);
                    let rewritten = rewrite_stylesheet(&css, base, &self.resolver);
                    chunk.replace(&rewritten, ContentType::Html);
                } else {
                    chunk.remove();
                }
                Ok(())
            }),
        ]);

        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: handlers,
                ..Settings::new()
            },
            |chunk: &[u8]| output.extend_from_slice(chunk),
        );

        rewriter.write(html)?;
        rewriter.end()?;
        Ok(output)
    }
}
