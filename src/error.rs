//! Operation-level error taxonomy and the API boundary wrapper.
//!
//! Every persistence operation returns [`OpError`].  At the HTTP boundary the
//! error is wrapped into an [`ApiError`] whose message is prefixed with the
//! operation's intent ("Failed to update album: ...") and which carries a
//! machine-readable [`ErrorKind`] alongside the human-readable message.
//!
//! Validation failures and missing authentication deliberately render the
//! same generic message.  Distinguishing them would leak which inputs exist
//! and which requests carried valid credentials; field-level reasons are
//! logged server-side only.

use serde::Serialize;

use crate::storage::StorageError;

/// A single field-level validation failure.  Logged, never returned to the
/// caller.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

/// Failure of a persistence operation.
#[derive(Debug)]
pub enum OpError {
    /// Input shape or constraint violation, with per-field reasons.
    Validation(Vec<FieldError>),
    /// No principal present in the request context.
    Unauthenticated,
    /// A row-level `id AND owner` match affected zero rows.  Callers must
    /// not be able to tell a missing resource from someone else's.
    NotFoundOrUnauthorized,
    /// The object storage provider failed.
    Storage(String),
    /// Any other database failure.
    Database(StorageError),
}

impl std::fmt::Display for OpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpError::Validation(fields) => write!(f, "validation failed ({} field(s))", fields.len()),
            OpError::Unauthenticated => write!(f, "no authenticated principal"),
            OpError::NotFoundOrUnauthorized => write!(f, "not found or not authorized"),
            OpError::Storage(msg) => write!(f, "storage provider error: {msg}"),
            OpError::Database(e) => write!(f, "database error: {e}"),
        }
    }
}

impl std::error::Error for OpError {}

impl From<StorageError> for OpError {
    fn from(e: StorageError) -> Self {
        OpError::Database(e)
    }
}

/// Machine-readable error discriminant surfaced to API callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationFailed,
    Unauthenticated,
    NotFoundOrUnauthorized,
    StorageProvider,
    Persistence,
}

/// The wire shape of a failed operation.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl OpError {
    /// Wrap this error for the API boundary.  `intent` names the operation,
    /// e.g. "update album".
    pub fn into_api(self, intent: &str) -> ApiError {
        let (kind, detail) = match self {
            OpError::Validation(_) => (
                ErrorKind::ValidationFailed,
                "invalid data or not authenticated".to_string(),
            ),
            OpError::Unauthenticated => (
                ErrorKind::Unauthenticated,
                "invalid data or not authenticated".to_string(),
            ),
            OpError::NotFoundOrUnauthorized => (
                ErrorKind::NotFoundOrUnauthorized,
                "not found or not authorized".to_string(),
            ),
            OpError::Storage(msg) => (ErrorKind::StorageProvider, msg),
            OpError::Database(e) => (ErrorKind::Persistence, e.to_string()),
        };
        ApiError {
            kind,
            message: format!("Failed to {intent}: {detail}"),
        }
    }
}
