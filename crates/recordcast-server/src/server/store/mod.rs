//! Record persistence.
//!
//! The HTTP layer only talks to the [`RecordStore`] trait; [`sqlite`] holds
//! the production implementation. Implementations own fixed-width column
//! handling: records handed back to callers are always unpadded.

pub mod sqlite;

use core::future::Future;
use recordcast_core::{Result, types::Record};

/// Durable table of records keyed by a store-assigned integer id.
pub trait RecordStore: Send + Sync + 'static {
    /// Persists `record` and returns its newly assigned id.
    fn insert(&self, record: Record) -> impl Future<Output = Result<i64>> + Send;

    /// Fetches one record.
    ///
    /// Fails with [`Error::RecordNotFound`](recordcast_core::Error::RecordNotFound)
    /// when no row has `id`.
    fn get_by_id(&self, id: i64) -> impl Future<Output = Result<Record>> + Send;

    /// Fetches every record in id order.
    ///
    /// Never returns an empty vector; an empty table is
    /// [`Error::NoRecords`](recordcast_core::Error::NoRecords).
    fn get_all(&self) -> impl Future<Output = Result<Vec<Record>>> + Send;
}
