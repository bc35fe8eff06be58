//! Shared helpers for the HTTP handlers.

use std::sync::Arc;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::alog;
use crate::auth::Principal;
use crate::error::{ApiError, ErrorKind, OpError};
use crate::web::state::SharedState;

/// Build a standard JSON error response.
pub fn api_error(status: StatusCode, kind: ErrorKind, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into(), "kind": kind });
    (status, axum::Json(body)).into_response()
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        // Validation and missing authentication share a status as well as
        // a message; the split would leak which one failed.
        ErrorKind::ValidationFailed | ErrorKind::Unauthenticated => StatusCode::BAD_REQUEST,
        ErrorKind::NotFoundOrUnauthorized => StatusCode::NOT_FOUND,
        ErrorKind::StorageProvider => StatusCode::BAD_GATEWAY,
        ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Wrap an operation failure for the wire.  Field-level validation reasons
/// are logged here and never leave the process.
pub fn respond_op_error(error: OpError, intent: &str) -> Response {
    if let OpError::Validation(fields) = &error {
        alog!("{intent}: validation failed: {fields:?}");
    }
    let ApiError { kind, message } = error.into_api(intent);
    api_error(status_for(kind), kind, message)
}

/// Extract the bearer token from the Authorization header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

/// Resolve the request's principal through the identity oracle.
///
/// The oracle is synchronous HTTP, so the call runs on the blocking pool.
/// An unreachable oracle resolves to no principal (fails closed) and is
/// logged; the operation then fails its own authentication check.
pub async fn resolve_principal(state: &SharedState, headers: &HeaderMap) -> Option<Principal> {
    let token = bearer_token(headers)?;
    let oracle = Arc::clone(&state.oracle);
    match tokio::task::spawn_blocking(move || oracle.current_principal(&token)).await {
        Ok(Ok(principal)) => principal,
        Ok(Err(e)) => {
            alog!("identity oracle unreachable: {e}");
            None
        }
        Err(e) => {
            alog!("identity check task failed: {e}");
            None
        }
    }
}
