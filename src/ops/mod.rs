//! Persistence operations: the validated, ownership-checked mutations and
//! reads behind the HTTP handlers.
//!
//! Every operation takes the shared [`AppState`](crate::web::state::AppState)
//! plus the principal the caller resolved from the identity oracle, so the
//! whole layer is exercisable without a server in front of it.  Mutations
//! arm a [`ViewGuard`](crate::invalidate::ViewGuard) first thing, which
//! fires the affected view paths on every exit path.

pub mod albums;
pub mod images;
pub mod profiles;
pub mod uploads;

use crate::auth::Principal;
use crate::error::OpError;

/// Current time as seconds since UNIX epoch.
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Current time as milliseconds since UNIX epoch.  Object keys embed
/// millisecond timestamps so two uploads of the same file name in the same
/// album get distinct keys.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub(crate) fn require_principal(principal: Option<&Principal>) -> Result<&Principal, OpError> {
    principal.ok_or(OpError::Unauthenticated)
}
