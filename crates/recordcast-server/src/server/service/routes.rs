//! HTTP routes of the record service.
//!
//! | Method | Path         | Success                                  |
//! |--------|--------------|------------------------------------------|
//! | POST   | `/user`      | `202`, body is the new id                |
//! | GET    | `/user/{id}` | `200`, merged encodings (`application/json`) |
//! | GET    | `/users`     | `200`, merged encodings of every record  |
//!
//! All routes are mounted under the configured base path.

use super::handler::{InflightGuard, RecordService};
use crate::server::{store::RecordStore, telemetry::increment_request_errors};
use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use bytes::Bytes;
use recordcast_core::Error;
use tower_http::trace::TraceLayer;

/// Builds the application router around `service`.
pub fn router<S: RecordStore>(service: RecordService<S>) -> Router {
    let base_path = service.config().base_path.clone();

    let api = Router::new()
        .route("/user", post(add_user::<S>))
        .route("/user/{id}", get(get_user::<S>))
        .route("/users", get(get_all_users::<S>))
        .with_state(service);

    let app = if base_path.is_empty() {
        api
    } else {
        Router::new().nest(&base_path, api)
    };

    app.layer(TraceLayer::new_for_http())
}

#[tracing::instrument(skip_all)]
async fn add_user<S: RecordStore>(
    State(service): State<RecordService<S>>,
    body: Bytes,
) -> Result<impl IntoResponse, Error> {
    let _inflight = InflightGuard::new();
    let id = service.add_user(&body).await.inspect_err(log_failure)?;
    tracing::debug!(id, "Stored record");
    Ok((StatusCode::ACCEPTED, id.to_string()))
}

#[tracing::instrument(skip_all)]
async fn get_user<S: RecordStore>(
    State(service): State<RecordService<S>>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let _inflight = InflightGuard::new();
    let id = raw_id
        .parse::<i64>()
        .map_err(|e| Error::InvalidRequest {
            reason: format!("invalid user id {raw_id:?}: {e}"),
        })
        .inspect_err(log_failure)?;

    let body = service.get_user(id).await.inspect_err(log_failure)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

#[tracing::instrument(skip_all)]
async fn get_all_users<S: RecordStore>(
    State(service): State<RecordService<S>>,
) -> Result<impl IntoResponse, Error> {
    let _inflight = InflightGuard::new();
    service.get_all_users().await.inspect_err(log_failure)
}

fn log_failure(err: &Error) {
    let status = err.status_code();
    if status.is_server_error() {
        increment_request_errors();
        tracing::error!(%status, "Request failed: {err}");
    } else {
        tracing::debug!(%status, "Request answered without a body: {err}");
    }
}
