//! Shared application state for the receiver.

use std::path::PathBuf;
use std::sync::Arc;

use articlesync_core::BatchQueue;

/// State handed to every handler.
pub struct AppState {
    /// Submission handle for the pipeline worker.
    pub queue: BatchQueue,
    /// Directory for archiving raw inbound payloads. Disabled when `None`.
    pub archive_dir: Option<PathBuf>,
}

pub type SharedState = Arc<AppState>;
