//! Upload grants: the presigned-PUT handshake.
//!
//! The service never touches image bytes.  An authenticated caller asks
//! for a grant, receives a signed PUT URL valid for sixty seconds plus the
//! long-lived public read URL, and uploads directly to the bucket.

use std::time::Duration;

use serde::Serialize;

use crate::alog;
use crate::auth::Principal;
use crate::error::OpError;
use crate::logging;
use crate::object_store::build_object_key;
use crate::ops::{now_millis, require_principal};
use crate::web::state::AppState;

/// How long a signed PUT URL stays valid.
pub const UPLOAD_GRANT_TTL_SECS: u64 = 60;

/// A time-boxed write authorization for one object.
#[derive(Debug, Clone, Serialize)]
pub struct UploadGrant {
    pub upload_url: String,
    pub public_url: String,
    pub object_key: String,
    pub expires_in_secs: u64,
}

pub async fn create_upload_grant(
    state: &AppState,
    principal: Option<&Principal>,
    file_base_name: &str,
    content_type: &str,
    album_id: &str,
) -> Result<UploadGrant, OpError> {
    let principal = require_principal(principal)?;

    let key = build_object_key(album_id, now_millis(), file_base_name);
    let upload_url = state
        .objects
        .presign_put(&key, content_type, Duration::from_secs(UPLOAD_GRANT_TTL_SECS))
        .await
        .map_err(OpError::Storage)?;
    let public_url = state.objects.public_url(&key);

    alog!(
        "upload grant issued for {} ({})",
        logging::album_id(album_id),
        logging::principal_id(&principal.id)
    );

    Ok(UploadGrant {
        upload_url,
        public_url,
        object_key: key,
        expires_in_secs: UPLOAD_GRANT_TTL_SECS,
    })
}
