use crate::server::streaming::{processor::handle_encode_request, request::WorkRequest};
use tokio::sync::mpsc;

/// Worker task responsible for processing [`WorkRequest`] messages.
///
/// The worker listens on an MPSC channel and processes requests until a
/// shutdown request arrives or every sender is dropped.
///
/// # Request Types
///
/// - [`WorkRequest::Encode`] - Encodes one record into one format via
///   [`handle_encode_request`].
/// - [`WorkRequest::Shutdown`] - Signals the worker to stop and acknowledge
///   shutdown.
pub async fn worker_loop(worker_id: usize, mut rx: mpsc::Receiver<WorkRequest>) {
    tracing::trace!("Worker {worker_id} started");

    while let Some(work) = rx.recv().await {
        match work {
            WorkRequest::Encode {
                task,
                outcome_tx,
                cancelled,
            } => {
                handle_encode_request(worker_id, task, &outcome_tx, &cancelled);
            }
            WorkRequest::Shutdown { response } => {
                tracing::debug!("Worker {worker_id} received shutdown signal");

                if response.send(()).is_err() {
                    tracing::error!("Worker {worker_id} failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    tracing::trace!("Worker {worker_id} stopped");
}
