//! Request handling for the record service.
//!
//! [`RecordService`] owns the record store and the encode worker pool. Each
//! operation runs under the configured per-request deadline; read operations
//! fan every fetched record out to the pool and collect the merged body.

use crate::server::{
    config::ServerConfig,
    pool::manager::WorkerPool,
    store::RecordStore,
    streaming::{collector::Collector, dispatcher::dispatch},
    telemetry::{
        decrement_requests_inflight, increment_payloads_encoded, increment_requests,
        increment_requests_inflight, record_collect_duration, record_records_per_request,
    },
};
use bytes::Bytes;
use core::future::Future;
use recordcast_core::{Error, Result, types::Record};
use std::sync::Arc;
use tokio::time::{Instant, timeout_at};

/// Record service shared by every HTTP handler.
///
/// Cloning is cheap: the store and the worker pool are reference counted.
pub struct RecordService<S> {
    config: ServerConfig,
    store: Arc<S>,
    worker_pool: Arc<WorkerPool>,
}

impl<S> Clone for RecordService<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            store: Arc::clone(&self.store),
            worker_pool: Arc::clone(&self.worker_pool),
        }
    }
}

impl<S: RecordStore> RecordService<S> {
    /// Creates the service and spawns its pool of encode workers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: ServerConfig, store: S) -> Self {
        let worker_pool = WorkerPool::spawn(
            config.num_workers,
            config.work_request_buffer_size,
            config.shutdown_timeout,
        );
        tracing::info!(
            num_workers = config.num_workers,
            buffer_size = config.work_request_buffer_size,
            "Spawned encode worker pool"
        );

        Self {
            config,
            store: Arc::new(store),
            worker_pool: Arc::new(worker_pool),
        }
    }

    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Initiates a graceful shutdown of the worker pool.
    ///
    /// Later read requests fail with [`Error::ServiceShutdown`].
    pub async fn shutdown(&self) -> Result<()> {
        self.worker_pool.shutdown().await
    }

    /// Decodes a JSON record and stores it, returning the assigned id.
    pub async fn add_user(&self, body: &[u8]) -> Result<i64> {
        let record = Record::from_json(body)?;
        self.with_deadline(self.store.insert(record)).await
    }

    /// Fetches one record and returns its merged encodings.
    pub async fn get_user(&self, id: i64) -> Result<Bytes> {
        self.with_deadline(async {
            let record = self.store.get_by_id(id).await?;
            self.encode_records(vec![record]).await
        })
        .await
    }

    /// Fetches every record and returns all their merged encodings.
    pub async fn get_all_users(&self) -> Result<Bytes> {
        self.with_deadline(async {
            let records = self.store.get_all().await?;
            self.encode_records(records).await
        })
        .await
    }

    async fn with_deadline<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let deadline = Instant::now() + self.config.request_timeout;
        timeout_at(deadline, fut)
            .await
            .map_err(|_| Error::DeadlineExceeded)?
    }

    /// Fans `records` out to the worker pool and waits for every payload.
    ///
    /// Any early return drops the dispatch, which cancels the request's
    /// queued tasks.
    async fn encode_records(&self, records: Vec<Record>) -> Result<Bytes> {
        let start = std::time::Instant::now();
        record_records_per_request(records.len() as f64);

        let mut dispatch = dispatch(records, &self.worker_pool).await?;
        let mut collector = Collector::new(dispatch.expected);
        collector.collect(&mut dispatch.outcomes).await?;

        increment_payloads_encoded(collector.state().received() as u64);
        record_collect_duration(start.elapsed().as_secs_f64() * 1000.0);

        Ok(collector.into_body())
    }
}

/// Counts a request and tracks it as in flight until dropped.
pub(crate) struct InflightGuard;

impl InflightGuard {
    pub(crate) fn new() -> Self {
        increment_requests();
        increment_requests_inflight();
        Self
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        decrement_requests_inflight();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{
        config::test_config,
        store::sqlite::{IN_MEMORY, SqliteStore},
    };
    use recordcast_core::{encode, types::{Format, Salary}};

    fn service() -> RecordService<SqliteStore> {
        RecordService::new(test_config(), SqliteStore::open(IN_MEMORY).unwrap())
    }

    #[tokio::test]
    async fn stores_and_encodes_one_record() {
        let service = service();
        let record = Record {
            name: "Carol".to_string(),
            age: 52,
            salary: Salary::from_cents(7_000_025),
            occupation: "Pilot".to_string(),
        };
        let body = encode(&record, Format::Json).unwrap();

        let id = service.add_user(&body).await.unwrap();
        assert!(id > 0);

        let merged = service.get_user(id).await.unwrap();
        let wanted: usize = Format::ALL
            .iter()
            .map(|&f| encode(&record, f).unwrap().len())
            .sum();
        assert_eq!(merged.len(), wanted);

        service.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let service = service();
        let err = service.add_user(b"{\"name\":").await.unwrap_err();
        assert!(matches!(err, Error::RequestDecode { .. }));
    }

    #[tokio::test]
    async fn reads_after_shutdown_are_refused() {
        let service = service();
        let body = br#"{"name":"Dan","age":20,"salary":1.5,"occupation":"Clerk"}"#;
        let id = service.add_user(body).await.unwrap();

        service.shutdown().await.unwrap();

        let err = service.get_user(id).await.unwrap_err();
        assert!(matches!(err, Error::ServiceShutdown));
    }
}
