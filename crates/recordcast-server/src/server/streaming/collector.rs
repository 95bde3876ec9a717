//! Fan-in of encode outcomes into one response body.
//!
//! A [`Collector`] is created per request with the number of outcomes the
//! dispatcher promised. It blocks on the request's outcome channel, appends
//! successful payloads in arrival order, and stops at the first of:
//!
//! - `received == expected` with no failure ([`Phase::Done`])
//! - a failure outcome ([`Phase::Failed`])
//! - the channel closing before `expected` outcomes arrived
//!   ([`Phase::Failed`], a task was lost)
//!
//! On failure the outcome channel is closed so tasks still in flight discard
//! their result instead of sending into a channel nobody reads.
//!
//! [`Collector::collect`] is cancel-safe: if its future is dropped (e.g. by a
//! deadline), no outcome is lost and the collector can be resumed.

use bytes::{Bytes, BytesMut};
use recordcast_core::{EncodeOutcome, Error, Result};
use tokio::sync::mpsc;

/// Position of a collection in its state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Collecting,
    Done,
    Failed,
}

/// Request-scoped bookkeeping of a collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollectionState {
    expected: usize,
    received: usize,
    failed: bool,
}

impl CollectionState {
    pub const fn new(expected: usize) -> Self {
        Self {
            expected,
            received: 0,
            failed: false,
        }
    }

    pub const fn expected(&self) -> usize {
        self.expected
    }

    pub const fn received(&self) -> usize {
        self.received
    }

    pub const fn failed(&self) -> bool {
        self.failed
    }

    pub const fn phase(&self) -> Phase {
        if self.failed {
            Phase::Failed
        } else if self.received == self.expected {
            Phase::Done
        } else {
            Phase::Collecting
        }
    }

    fn record_success(&mut self) {
        debug_assert_eq!(self.phase(), Phase::Collecting);
        self.received += 1;
    }

    fn record_failure(&mut self) {
        self.failed = true;
    }
}

/// Merges the outcomes of one request into a buffered body.
#[derive(Debug)]
pub struct Collector {
    state: CollectionState,
    body: BytesMut,
    failure: Option<Error>,
}

impl Collector {
    pub fn new(expected: usize) -> Self {
        Self {
            state: CollectionState::new(expected),
            body: BytesMut::new(),
            failure: None,
        }
    }

    pub const fn state(&self) -> CollectionState {
        self.state
    }

    /// Consumes outcomes until the collection is done or has failed.
    ///
    /// Returns immediately if the collection already reached a terminal
    /// phase; a failed collection keeps reporting its first failure.
    ///
    /// # Errors
    ///
    /// - [`Error::Encode`] for the first failure outcome.
    /// - [`Error::ChannelError`] if every sender went away before `expected`
    ///   outcomes arrived.
    pub async fn collect(&mut self, outcomes: &mut mpsc::Receiver<EncodeOutcome>) -> Result<()> {
        loop {
            if let Some(err) = &self.failure {
                return Err(err.clone());
            }
            if self.state.phase() == Phase::Done {
                return Ok(());
            }

            match outcomes.recv().await {
                Some(EncodeOutcome::Success(bytes)) => {
                    self.body.extend_from_slice(&bytes);
                    self.state.record_success();
                    tracing::trace!(
                        received = self.state.received,
                        expected = self.state.expected,
                        "Collected payload"
                    );
                }
                Some(EncodeOutcome::Failure(e)) => self.fail(outcomes, Error::Encode(e)),
                None => {
                    let context = format!(
                        "outcome channel closed after {} of {} outcomes",
                        self.state.received, self.state.expected
                    );
                    self.fail(outcomes, Error::ChannelError { context });
                }
            }
        }
    }

    /// Returns the merged body. Only complete after [`Phase::Done`].
    pub fn into_body(self) -> Bytes {
        self.body.freeze()
    }

    fn fail(&mut self, outcomes: &mut mpsc::Receiver<EncodeOutcome>, err: Error) {
        tracing::warn!(
            received = self.state.received,
            expected = self.state.expected,
            "Collection aborted: {err}"
        );
        outcomes.close();
        self.state.record_failure();
        self.failure = Some(err);
    }
}
