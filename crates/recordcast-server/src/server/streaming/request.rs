use recordcast_core::{
    EncodeOutcome,
    types::{Format, Record},
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// One unit of encode work: a record paired with a target format.
///
/// The record is shared between the [`FORMAT_COUNT`] tasks created for it.
///
/// [`FORMAT_COUNT`]: recordcast_core::types::FORMAT_COUNT
#[derive(Debug, Clone)]
pub struct EncodeTask {
    pub record: Arc<Record>,
    pub format: Format,
}

/// A message sent to a worker task.
#[derive(Debug)]
pub enum WorkRequest {
    /// Encode one task and report exactly one outcome on `outcome_tx`, unless
    /// `cancelled` fires first.
    Encode {
        task: EncodeTask,
        outcome_tx: mpsc::Sender<EncodeOutcome>,
        cancelled: CancellationToken,
    },
    /// Stop the worker and acknowledge on `response`.
    Shutdown { response: oneshot::Sender<()> },
}
