//! Bounded batch queue between the inbound receiver and the pipeline worker.
//!
//! The receiver acknowledges immediately after submitting; a single worker
//! task owns the [`Pipeline`] and drains the queue, so batches (and the
//! articles within them) are processed strictly sequentially. The bound
//! makes the concurrent-batch limit explicit: overflow is logged and the
//! batch dropped rather than queued without limit.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{error, info, warn};

use articlesync_shared::ArticleBatch;

use crate::pipeline::Pipeline;

/// Submission handle for the pipeline worker. Cheap to clone.
#[derive(Clone)]
pub struct BatchQueue {
    tx: mpsc::Sender<ArticleBatch>,
}

impl BatchQueue {
    /// Spawn the worker task owning `pipeline` and return the handle.
    pub fn spawn(pipeline: Pipeline, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<ArticleBatch>(capacity);

        tokio::spawn(async move {
            info!(capacity, "batch worker started");
            while let Some(batch) = rx.recv().await {
                pipeline.process_batch(&batch).await;
            }
            info!("batch worker stopped");
        });

        Self { tx }
    }

    /// Submit a batch without blocking. Returns `false` (and logs) when the
    /// queue is full or the worker is gone; the caller still acknowledges
    /// the inbound request either way.
    pub fn submit(&self, batch: ArticleBatch) -> bool {
        match self.tx.try_send(batch) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("batch queue full, dropping batch");
                false
            }
            Err(TrySendError::Closed(_)) => {
                error!("batch worker is gone, dropping batch");
                false
            }
        }
    }

    /// A queue with no worker attached, for exercising the bound in tests.
    #[cfg(test)]
    fn detached(capacity: usize) -> (Self, mpsc::Receiver<ArticleBatch>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}
