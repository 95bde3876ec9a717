//! HTTP service implementation.
//!
//! ## Structure
//!
//! - [`handler`] - the [`RecordService`](handler::RecordService) shared by all
//!   routes: deadlines, store access and the encode fan-out.
//! - [`routes`] - the axum router and its handlers.

pub mod handler;
pub mod routes;
