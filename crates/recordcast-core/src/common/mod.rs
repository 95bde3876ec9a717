//! Types shared between the HTTP layer, the record store and the encode
//! workers.
//!
//! ## Modules
//!
//! - [`types`] - [`Record`](types::Record), its fixed-precision
//!   [`Salary`](types::Salary) and the closed [`Format`](types::Format) set.
//! - [`encode`] - the per-format encoders and [`EncodeOutcome`].
//! - [`error`] - the service-wide [`Error`] and its HTTP mapping.

pub mod encode;
pub mod error;
pub mod types;

pub use encode::{EncodeError, EncodeOutcome, encode};
pub use error::{Error, Result};
