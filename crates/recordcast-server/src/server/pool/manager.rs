//! Asynchronous worker pool for encode tasks.
//!
//! This module defines the [`WorkerPool`] struct, which manages a set of
//! asynchronous workers responsible for processing [`WorkRequest`]s. It
//! distributes work using round-robin scheduling and supports coordinated
//! shutdown via a shared [`CancellationToken`].
//!
//! Each worker listens on its own bounded [`mpsc::Receiver`] and executes tasks
//! independently. The pool bounds the number of concurrently running encode
//! tasks no matter how many records a request fans out to.

use super::worker::worker_loop;
use crate::server::streaming::request::WorkRequest;
use core::time::Duration;
use recordcast_core::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::{
    sync::{mpsc, oneshot},
    time::timeout,
};
use tokio_util::sync::CancellationToken;

/// A cooperative pool of asynchronous workers that process [`WorkRequest`]s.
///
/// Workers receive requests over bounded MPSC channels. Work is distributed in
/// round-robin fashion and the pool supports graceful, cancellable shutdown.
pub struct WorkerPool {
    workers: Vec<mpsc::Sender<WorkRequest>>,
    next_worker: AtomicUsize,
    shutdown_token: CancellationToken,
    shutdown_timeout: Duration,
}

impl WorkerPool {
    /// Constructs a new [`WorkerPool`] from initialized worker channels and a
    /// shared cancellation token.
    pub const fn new(
        workers: Vec<mpsc::Sender<WorkRequest>>,
        shutdown_token: CancellationToken,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            workers,
            next_worker: AtomicUsize::new(0),
            shutdown_token,
            shutdown_timeout,
        }
    }

    /// Spawns `num_workers` worker tasks, each with a queue of
    /// `buffer_size` pending requests.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(num_workers: usize, buffer_size: usize, shutdown_timeout: Duration) -> Self {
        let mut workers = Vec::with_capacity(num_workers);

        for worker_id in 0..num_workers {
            let (tx, rx) = mpsc::channel(buffer_size);
            workers.push(tx);
            tokio::spawn(worker_loop(worker_id, rx));
        }

        Self::new(workers, CancellationToken::new(), shutdown_timeout)
    }

    /// Returns the index of the next worker to receive work (round-robin).
    ///
    /// Uses a relaxed atomic increment to minimize contention.
    pub fn next_worker_index(&self) -> usize {
        self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Sends a [`WorkRequest`] to the next worker in the pool, waiting for
    /// queue space if that worker is busy.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The service is shutting down (`shutdown_token` was cancelled).
    /// - The worker's channel is closed.
    pub async fn send_to_next_worker(&self, request: WorkRequest) -> Result<(), Error> {
        if self.shutdown_token.is_cancelled() {
            return Err(Error::ServiceShutdown);
        }

        let worker_idx = self.next_worker_index();
        let worker = &self.workers[worker_idx];

        match worker.send(request).await {
            Ok(()) => Ok(()),
            Err(_) => Err(Error::ChannelError {
                context: format!("Worker {worker_idx} channel closed"),
            }),
        }
    }

    /// Gracefully shuts down all workers in the pool.
    ///
    /// - Cancels the shared [`CancellationToken`] to refuse new work.
    /// - Sends a [`WorkRequest::Shutdown`] to each worker. Requests already
    ///   queued ahead of it are still drained.
    /// - Waits (up to `shutdown_timeout` per worker) for acknowledgements.
    pub async fn shutdown(&self) -> Result<(), Error> {
        tracing::info!("Refusing new encode work");
        self.shutdown_token.cancel();

        tracing::debug!("Notifying all workers to shut down");
        let mut shutdown_handles = Vec::with_capacity(self.workers.len());

        for (i, worker) in self.workers.iter().enumerate() {
            let (tx, rx) = oneshot::channel();
            if let Err(e) = worker.send(WorkRequest::Shutdown { response: tx }).await {
                tracing::error!("Failed to send shutdown to worker {i}: {e}");
            } else {
                shutdown_handles.push((i, rx));
            }
        }

        let wait = self.shutdown_timeout;
        tracing::debug!(
            "Waiting for up to {}ms per worker for shutdown acknowledgements",
            wait.as_millis()
        );

        let timeout_futures = shutdown_handles.into_iter().map(|(i, rx)| async move {
            match timeout(wait, rx).await {
                Ok(Ok(())) => tracing::trace!("Worker {i} shutdown acknowledged"),
                Ok(Err(e)) => tracing::error!("Worker {i} returned error: {e}"),
                Err(_) => tracing::warn!("Worker {i} shutdown timed out"),
            }
        });

        futures::future::join_all(timeout_futures).await;

        tracing::info!("Worker pool shutdown complete");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::streaming::request::EncodeTask;
    use recordcast_core::{
        EncodeOutcome,
        types::{Format, Record, Salary},
    };
    use std::sync::Arc;

    fn encode_request(outcome_tx: &mpsc::Sender<EncodeOutcome>) -> WorkRequest {
        WorkRequest::Encode {
            task: EncodeTask {
                record: Arc::new(Record {
                    name: "Alice".to_string(),
                    age: 30,
                    salary: Salary::from_cents(100),
                    occupation: "Engineer".to_string(),
                }),
                format: Format::Json,
            },
            outcome_tx: outcome_tx.clone(),
            cancelled: CancellationToken::new(),
        }
    }

    #[test]
    fn round_robin_wraps_around() {
        let workers = (0..3).map(|_| mpsc::channel(1).0).collect();
        let pool = WorkerPool::new(workers, CancellationToken::new(), Duration::from_secs(1));
        let picked: Vec<_> = (0..7).map(|_| pool.next_worker_index()).collect();
        assert_eq!(picked, [0, 1, 2, 0, 1, 2, 0]);
    }

    #[tokio::test]
    async fn workers_process_requests() {
        let pool = WorkerPool::spawn(2, 4, Duration::from_secs(1));
        let (tx, mut rx) = mpsc::channel(4);

        for _ in 0..4 {
            pool.send_to_next_worker(encode_request(&tx)).await.unwrap();
        }
        for _ in 0..4 {
            assert!(rx.recv().await.unwrap().is_success());
        }

        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_refuses_new_work() {
        let pool = WorkerPool::spawn(2, 4, Duration::from_secs(1));
        pool.shutdown().await.unwrap();
        assert!(pool.is_shutting_down());

        let (tx, _rx) = mpsc::channel(1);
        let err = pool.send_to_next_worker(encode_request(&tx)).await.unwrap_err();
        assert!(matches!(err, Error::ServiceShutdown));
    }
}
