//! Inbound webhook handlers.
//!
//! The notifier always receives a fast, uniform acknowledgment: processing
//! outcomes are observable only through logs and store state, never through
//! the response. A malformed payload is logged and still acknowledged so the
//! upstream does not retry-storm us.

use std::path::Path;

use axum::extract::State;
use tracing::{info, warn};

use articlesync_shared::{ArticleBatch, ArticleSyncError};

use crate::state::SharedState;

/// `POST /artlist` — receive a batch of published-article references.
pub async fn receive_batch(State(state): State<SharedState>, body: String) -> &'static str {
    if let Some(dir) = &state.archive_dir {
        archive_payload(dir, &body);
    }

    match serde_json::from_str::<ArticleBatch>(&body) {
        Ok(batch) if !batch.data.is_empty() => {
            info!(articles = batch.data.len(), "batch accepted");
            state.queue.submit(batch);
        }
        Ok(_) => {
            info!("batch contains no articles, ignored");
        }
        Err(e) => {
            let err = ArticleSyncError::malformed(e.to_string());
            warn!(error = %err, "inbound payload ignored");
        }
    }

    "success"
}

/// `GET /healthz` — liveness probe.
pub async fn healthz() -> &'static str {
    "ok"
}

/// Best-effort archival of the raw payload under a timestamped file name.
fn archive_payload(dir: &Path, body: &str) {
    let name = format!(
        "{}.json",
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S_%3f")
    );
    let path = dir.join(name);

    let result = std::fs::create_dir_all(dir).and_then(|()| std::fs::write(&path, body));
    match result {
        Ok(()) => info!(path = %path.display(), "payload archived"),
        Err(e) => warn!(path = %path.display(), error = %e, "payload archive failed"),
    }
}
