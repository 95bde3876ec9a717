//! Per-request encode fan-out and fan-in.
//!
//! - [`dispatcher`] - turns fetched records into `records × formats` encode
//!   tasks on the worker pool.
//! - [`processor`] - runs one task inside a worker.
//! - [`collector`] - merges the outcomes into one buffered body and decides
//!   completion or failure.
//! - [`request`] - messages exchanged with workers.

pub mod collector;
pub mod dispatcher;
pub mod processor;
pub mod request;
