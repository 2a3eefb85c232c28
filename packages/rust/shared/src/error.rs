//! Error types for ArticleSync.
//!
//! Library crates use [`ArticleSyncError`] via `thiserror`.
//! App crates (server/cli) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all ArticleSync operations.
///
/// The pipeline pattern-matches on these variants to decide skip-vs-continue
/// per article, so each failure class gets its own variant rather than a
/// catch-all.
#[derive(Debug, thiserror::Error)]
pub enum ArticleSyncError {
    /// Configuration loading or validation error (missing credentials,
    /// empty knowledge-base id). A setup defect, never a runtime condition.
    #[error("config error: {message}")]
    Config { message: String },

    /// Article download failure (network error or non-2xx status).
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Extraction yielded nothing usable at any fallback level.
    #[error("no content: {message}")]
    NoContent { message: String },

    /// Document upload failed at the transport layer (connection error,
    /// non-2xx status, unreadable response).
    #[error("sync transport error: {0}")]
    SyncTransport(String),

    /// Document upload succeeded at the protocol layer but the remote
    /// business code was non-zero.
    #[error("sync business error (code {code}): {message}")]
    SyncBusiness { code: i64, message: String },

    /// Unparseable or incomplete inbound payload.
    #[error("malformed input: {message}")]
    MalformedInput { message: String },

    /// Filesystem I/O error (dedup log, payload archive).
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ArticleSyncError>;

impl ArticleSyncError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a no-content error from any displayable message.
    pub fn no_content(msg: impl Into<String>) -> Self {
        Self::NoContent {
            message: msg.into(),
        }
    }

    /// Create a malformed-input error from any displayable message.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is an upload failure (either sync variant).
    ///
    /// Callers treat both variants identically: log and move on.
    pub fn is_sync_failure(&self) -> bool {
        matches!(self, Self::SyncTransport(_) | Self::SyncBusiness { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ArticleSyncError::config("COZE_API_KEY not set");
        assert_eq!(err.to_string(), "config error: COZE_API_KEY not set");

        let err = ArticleSyncError::SyncBusiness {
            code: 1001,
            message: "invalid".into(),
        };
        assert!(err.to_string().contains("1001"));
    }

    #[test]
    fn sync_failure_classification() {
        assert!(ArticleSyncError::SyncTransport("timeout".into()).is_sync_failure());
        assert!(
            ArticleSyncError::SyncBusiness {
                code: 1,
                message: "x".into()
            }
            .is_sync_failure()
        );
        assert!(!ArticleSyncError::Fetch("HTTP 404".into()).is_sync_failure());
    }
}
