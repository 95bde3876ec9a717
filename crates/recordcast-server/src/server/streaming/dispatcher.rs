use super::request::{EncodeTask, WorkRequest};
use crate::server::pool::manager::WorkerPool;
use recordcast_core::{
    EncodeOutcome, Result,
    types::{FORMAT_COUNT, Format, Record},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

/// The in-flight encode fan-out of one request.
///
/// Owns the receiving end of the request's outcome channel and a guard on the
/// request's cancellation token: dropping the dispatch (request finished,
/// aborted, or timed out) cancels every task that has not run yet.
#[derive(Debug)]
pub struct Dispatch {
    pub expected: usize,
    pub outcomes: mpsc::Receiver<EncodeOutcome>,
    _cancel_on_drop: DropGuard,
}

/// Starts one encode task per `(record, format)` pair on `worker_pool`.
///
/// The outcome channel has exactly one slot per task, so workers never wait
/// on the collector. `expected` is `records.len() * FORMAT_COUNT`, the number
/// of tasks actually handed to the pool.
///
/// # Errors
///
/// Fails only if the pool refuses work (shutdown, closed worker). Tasks
/// already started are cancelled before the error is returned.
pub async fn dispatch(records: Vec<Record>, worker_pool: &WorkerPool) -> Result<Dispatch> {
    let expected = records.len() * FORMAT_COUNT;
    let (outcome_tx, outcomes) = mpsc::channel(expected.max(1));
    let cancelled = CancellationToken::new();
    let guard = cancelled.clone().drop_guard();

    for record in records.into_iter().map(Arc::new) {
        for format in Format::ALL {
            let task = EncodeTask {
                record: Arc::clone(&record),
                format,
            };
            worker_pool
                .send_to_next_worker(WorkRequest::Encode {
                    task,
                    outcome_tx: outcome_tx.clone(),
                    cancelled: cancelled.clone(),
                })
                .await?;
        }
    }

    tracing::debug!(expected, "Dispatched encode tasks");

    Ok(Dispatch {
        expected,
        outcomes,
        _cancel_on_drop: guard,
    })
}
