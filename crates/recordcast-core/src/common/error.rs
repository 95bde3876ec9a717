//! Error types for the record service.
//!
//! This module defines the central `Error` enum, which captures every
//! reportable failure of a request. It implements [`IntoResponse`] so axum
//! handlers can return it directly; the mapping keeps internal details out of
//! response bodies and only surfaces a short plain-text message.
//!
//! ## Error Cases
//! - `RequestDecode`: The inbound body is not a valid record.
//! - `InvalidRequest`: A path parameter could not be parsed.
//! - `Store`: The backing store failed.
//! - `RecordNotFound`: No row exists for the requested id.
//! - `NoRecords`: The store is empty.
//! - `Encode`: One of the encode tasks produced a failure outcome.
//! - `ChannelError`: An internal communication failure between tasks or
//!   workers.
//! - `DeadlineExceeded`: The request ran past its deadline.
//! - `ServiceShutdown`: A request arrived while the service was shutting down.

use crate::encode::EncodeError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the record service.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// Malformed inbound request body.
    #[error("Request decoding error: {reason}")]
    RequestDecode { reason: String },

    /// A request parameter could not be interpreted.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Backing store failure.
    #[error("Store error: {context}")]
    Store { context: String },

    /// The requested id has no row.
    #[error("Record {id} not found")]
    RecordNotFound { id: i64 },

    /// The store holds no rows at all.
    #[error("No records in store")]
    NoRecords,

    /// An encode task failed; the whole collection is aborted.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Internal channel send/receive failure (e.g., closed channel).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The request deadline elapsed before a response was ready.
    #[error("Request deadline exceeded")]
    DeadlineExceeded,

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl Error {
    /// HTTP status reported to the caller for this error.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::RecordNotFound { .. } => StatusCode::NOT_FOUND,
            Self::NoRecords => StatusCode::NO_CONTENT,
            Self::ServiceShutdown => StatusCode::SERVICE_UNAVAILABLE,
            Self::RequestDecode { .. }
            | Self::InvalidRequest { .. }
            | Self::Store { .. }
            | Self::Encode(_)
            | Self::ChannelError { .. }
            | Self::DeadlineExceeded => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn public_message(&self) -> &'static str {
        match self {
            Self::RequestDecode { .. } => "request decoding error",
            Self::InvalidRequest { .. } => "error getting user id",
            Self::Store { .. } => "storage error",
            Self::RecordNotFound { .. } => "user not found",
            Self::NoRecords => "",
            Self::Encode(_) => "encoding error",
            Self::ChannelError { .. } => "internal error",
            Self::DeadlineExceeded => "request timed out",
            Self::ServiceShutdown => "service is shutting down",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // 204 must not carry a body.
        if status == StatusCode::NO_CONTENT {
            return status.into_response();
        }
        (status, self.public_message()).into_response()
    }
}
