use super::request::EncodeTask;
use recordcast_core::{EncodeOutcome, encode};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

/// Handles a single encode task within a worker.
///
/// Encodes `task.record` into `task.format` and reports the outcome on
/// `outcome_tx`. The send never blocks: the outcome channel is created with
/// one slot per dispatched task, so a full channel means the collector's
/// bookkeeping is broken, and a closed channel means the collector has
/// already finished or aborted and the outcome is discarded.
///
/// # Behavior
///
/// - Returns without encoding or emitting when the request was cancelled or
///   the collector is gone.
/// - Emits exactly one [`EncodeOutcome`] otherwise, success or failure.
pub fn handle_encode_request(
    worker_id: usize,
    task: EncodeTask,
    outcome_tx: &mpsc::Sender<EncodeOutcome>,
    cancelled: &CancellationToken,
) {
    if cancelled.is_cancelled() || outcome_tx.is_closed() {
        tracing::trace!(worker_id, format = %task.format, "Skipping cancelled encode task");
        return;
    }

    let outcome = EncodeOutcome::from(encode(&task.record, task.format));
    if let EncodeOutcome::Failure(e) = &outcome {
        tracing::warn!(worker_id, "Encode task failed: {e}");
    }

    match outcome_tx.try_send(outcome) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            tracing::error!(
                worker_id,
                format = %task.format,
                "Outcome channel full, dropping outcome"
            );
        }
        Err(TrySendError::Closed(_)) => {
            tracing::debug!(worker_id, "Collector gone, discarding outcome");
        }
    }
}
