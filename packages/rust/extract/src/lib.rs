//! Heuristic content extraction for platform article HTML.
//!
//! Three pure operations over a parsed document:
//! - [`extract_snippet`] — bounded summary text with a container fallback chain
//! - [`extract_full_text`] — newline-joined paragraph text, unbounded
//! - [`extract_references`] — cited reference links with a title fallback chain
//!
//! The rules are tuned to one content platform's markup (primary content
//! container `div#js_content`, redirect-style reference links). Source markup
//! is inconsistent: references are sometimes live anchors with rich captions
//! and sometimes plain copy-pasted text, so every operation degrades through
//! explicit fallbacks instead of dropping content.

mod dom;

use std::collections::BTreeSet;

use regex::Regex;
use tracing::debug;

use articlesync_shared::{ArticleSyncError, ReferenceEntry, Result};

pub use dom::ArticleDom;

/// Id of the platform's primary content container.
pub const PRIMARY_CONTENT_ID: &str = "js_content";

/// Snippet length when extracted from the primary container.
const SNIPPET_MAX_CHARS: usize = 150;

/// Snippet length on the body/document fallback paths.
const FALLBACK_SNIPPET_MAX_CHARS: usize = 100;

/// Pattern matching the platform's redirect-style reference links.
const REFERENCE_LINK_PATTERN: &str = r"https://s\.caixuan\.cc/[A-Za-z0-9]+";

/// Leading caption labels stripped from reference titles.
const TITLE_LABELS: [&str; 3] = ["来源文章", "延伸阅读", "相关链接"];

// ---------------------------------------------------------------------------
// Snippet
// ---------------------------------------------------------------------------

/// Extract a bounded snippet from the article.
///
/// Fallback chain: primary content container (150 chars) → `<body>` text
/// (100 chars) → whole-document text (100 chars). Fails with a no-content
/// error only when every level is empty.
pub fn extract_snippet(dom: &ArticleDom) -> Result<String> {
    if let Some(text) = dom.text_by_id(PRIMARY_CONTENT_ID, "") {
        if !text.is_empty() {
            return Ok(truncate_chars(&text, SNIPPET_MAX_CHARS));
        }
    }

    debug!("primary content container missing or empty, falling back");

    if let Some(text) = dom.body_text("") {
        if !text.is_empty() {
            return Ok(truncate_chars(&text, FALLBACK_SNIPPET_MAX_CHARS));
        }
    }

    let text = dom.document_text("");
    if !text.is_empty() {
        return Ok(truncate_chars(&text, FALLBACK_SNIPPET_MAX_CHARS));
    }

    Err(ArticleSyncError::no_content(
        "document has no extractable text at any level",
    ))
}

// ---------------------------------------------------------------------------
// Full text
// ---------------------------------------------------------------------------

/// Extract the full article text, paragraphs joined with newlines.
///
/// Same container fallback order as the snippet, without truncation.
pub fn extract_full_text(dom: &ArticleDom) -> Result<String> {
    if let Some(text) = dom.text_by_id(PRIMARY_CONTENT_ID, "\n") {
        if !text.is_empty() {
            return Ok(text);
        }
    }

    if let Some(text) = dom.body_text("\n") {
        if !text.is_empty() {
            return Ok(text);
        }
    }

    let text = dom.document_text("\n");
    if !text.is_empty() {
        return Ok(text);
    }

    Err(ArticleSyncError::no_content(
        "document has no extractable text at any level",
    ))
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

/// Extract cited reference links with resolved titles.
///
/// Candidate links are collected by regex over the serialized markup,
/// deliberately decoupled from tag structure: the same link may appear as a
/// live anchor in one article and as inert text in another. Links are
/// deduplicated and emitted in sorted order.
///
/// Title fallback chain per link:
/// 1. text of the anchor's nearest block ancestor, with a leading caption
///    label stripped;
/// 2. the anchor's own text;
/// 3. the caller-supplied `default_title` (typically the article's title).
pub fn extract_references(dom: &ArticleDom, default_title: &str) -> Vec<ReferenceEntry> {
    let re = Regex::new(REFERENCE_LINK_PATTERN).unwrap();
    let html = dom.serialize();

    // BTreeSet gives set semantics and sorted-by-link emission in one pass.
    let links: BTreeSet<String> = re
        .find_iter(&html)
        .map(|m| m.as_str().to_string())
        .collect();

    debug!(candidates = links.len(), "reference links collected");

    links
        .into_iter()
        .map(|link| {
            let title = resolve_reference_title(dom, &link)
                .unwrap_or_else(|| default_title.to_string());
            ReferenceEntry { title, link }
        })
        .collect()
}

/// Resolve a reference title from the anchor context, or `None` when the
/// link only appears as inert text.
fn resolve_reference_title(dom: &ArticleDom, link: &str) -> Option<String> {
    if !dom.has_anchor(link) {
        return None;
    }

    if let Some(raw) = dom.block_ancestor_text(link) {
        let stripped = strip_title_label(&raw);
        if !stripped.is_empty() {
            return Some(stripped);
        }
    }

    dom.anchor_text(link).filter(|text| !text.is_empty())
}

/// Strip a known leading caption label plus any following colon/whitespace.
fn strip_title_label(raw: &str) -> String {
    let mut text = raw.trim();
    for label in TITLE_LABELS {
        if let Some(rest) = text.strip_prefix(label) {
            text = rest
                .trim_start_matches(|c: char| c == ':' || c == '：' || c.is_whitespace());
            break;
        }
    }
    text.to_string()
}

/// Truncate to at most `max` characters, never splitting a code point.
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
