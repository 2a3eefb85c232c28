//! Core domain types for ArticleSync batches.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

/// Query parameter carrying the article identifier used for deduplication.
pub const SN_QUERY_PARAM: &str = "sn";

// ---------------------------------------------------------------------------
// ArticleRef / ArticleBatch
// ---------------------------------------------------------------------------

/// A single article reference from the inbound batch.
///
/// The usual form carries `url`; the alternate inbound form carries inline
/// HTML `content` plus a notifier `msg_id` instead of a URL. Inline items
/// have no `sn` and stay outside deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRef {
    /// Article URL. Absent for inline-content items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Article title, also used as the document name and as the default
    /// reference title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Publishing channel name, matched against the whitelist.
    #[serde(default)]
    pub source_channel: String,

    /// Inline HTML content (alternate inbound form).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Notifier message id; used to derive a synthetic identifier for
    /// inline items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<String>,
}

fn default_title() -> String {
    "无标题".into()
}

/// The inbound batch payload shape: `{ "data": [ ... ] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleBatch {
    /// Article references, processed in order.
    #[serde(default)]
    pub data: Vec<ArticleRef>,
}

/// Extract the `sn` query parameter from an article URL.
///
/// Returns `None` when the URL is unparseable or carries no non-empty `sn`
/// parameter; such articles cannot be deduplicated and are skipped by the
/// pipeline without touching the dedup store.
pub fn article_sn(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == SN_QUERY_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Derive a stable synthetic identifier for an inline-content item from its
/// notifier message id. Used for document naming and log correlation only,
/// never as a dedup key.
pub fn synthetic_id(msg_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(msg_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// ReferenceEntry
// ---------------------------------------------------------------------------

/// A cited reference extracted from an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// Human-readable title, resolved via the extraction fallback chain.
    pub title: String,
    /// The reference link. Unique within one extraction result.
    pub link: String,
}

// ---------------------------------------------------------------------------
// Whitelist
// ---------------------------------------------------------------------------

/// Fixed set of accepted source-channel names (case-sensitive exact match).
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    channels: HashSet<String>,
}

impl Whitelist {
    /// Build a whitelist from configured channel names.
    pub fn new(channels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            channels: channels.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `source_channel` is accepted. Missing or unrecognized
    /// channels are rejected; rejection is logged by the caller.
    pub fn accepts(&self, source_channel: &str) -> bool {
        self.channels.contains(source_channel)
    }

    /// Number of configured channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channels are configured (everything is rejected).
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_deserializes_camel_case() {
        let json = r#"{
            "data": [
                { "url": "https://example.com/a?sn=ABC", "title": "T1", "sourceChannel": "tech" },
                { "title": "T2", "sourceChannel": "tech", "content": "<p>hi</p>", "msgId": "m-1" }
            ]
        }"#;
        let batch: ArticleBatch = serde_json::from_str(json).expect("parse batch");
        assert_eq!(batch.data.len(), 2);
        assert_eq!(batch.data[0].source_channel, "tech");
        assert_eq!(batch.data[1].msg_id.as_deref(), Some("m-1"));
        assert!(batch.data[1].url.is_none());
    }

    #[test]
    fn missing_title_gets_default() {
        let json = r#"{ "url": "https://example.com/a", "sourceChannel": "tech" }"#;
        let article: ArticleRef = serde_json::from_str(json).expect("parse article");
        assert_eq!(article.title, "无标题");
    }

    #[test]
    fn sn_extraction() {
        assert_eq!(
            article_sn("https://mp.example.com/s?__biz=MjM5&sn=XYZ999&idx=1"),
            Some("XYZ999".into())
        );
        assert_eq!(article_sn("https://site/a?x=1"), None);
        assert_eq!(article_sn("https://site/a?sn="), None);
        assert_eq!(article_sn("not a url"), None);
    }

    #[test]
    fn synthetic_id_is_stable() {
        let a = synthetic_id("msg-42");
        let b = synthetic_id("msg-42");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64); // SHA-256 hex
        assert_ne!(a, synthetic_id("msg-43"));
    }

    #[test]
    fn whitelist_exact_match() {
        let wl = Whitelist::new(["tech", "科技前沿"]);
        assert!(wl.accepts("tech"));
        assert!(wl.accepts("科技前沿"));
        assert!(!wl.accepts("Tech")); // case-sensitive
        assert!(!wl.accepts(""));
    }

    #[test]
    fn empty_whitelist_rejects_all() {
        let wl = Whitelist::default();
        assert!(wl.is_empty());
        assert!(!wl.accepts("tech"));
    }
}
