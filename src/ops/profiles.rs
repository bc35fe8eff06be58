//! Profile operations.
//!
//! One profile per principal, created after first authentication.  The
//! username is the public routing key; profiles are never hard-deleted
//! here (account deletion is the identity provider's concern).

use uuid::Uuid;

use crate::alog;
use crate::auth::Principal;
use crate::error::OpError;
use crate::invalidate::{ViewGuard, DASHBOARD_PATH};
use crate::logging;
use crate::ops::{now_secs, require_principal};
use crate::storage::ProfileRow;
use crate::validate::ProfileInput;
use crate::web::state::AppState;

/// Create the caller's profile.  Fails on a taken username or an already
/// existing profile for the same principal.
pub async fn create_profile(
    state: &AppState,
    principal: Option<&Principal>,
    input: ProfileInput,
) -> Result<ProfileRow, OpError> {
    let _guard = ViewGuard::new(&state.invalidator, vec![DASHBOARD_PATH.to_string()]);
    let principal = require_principal(principal)?;
    let input = input.normalized()?;

    let now = now_secs();
    let row = ProfileRow {
        id: Uuid::new_v4().to_string(),
        owner_id: principal.id.clone(),
        display_name: input.display_name,
        username: input.username,
        bio: input
            .bio
            .unwrap_or_else(|| "Welcome to my profile!".to_string()),
        image_url: input.image_url.or_else(|| principal.avatar_url.clone()),
        created_at: now,
        updated_at: now,
    };

    let storage = state.storage.lock().await;
    storage.insert_profile(&row)?;
    drop(storage);

    alog!(
        "profile created: {} ({})",
        row.username,
        logging::principal_id(&row.owner_id)
    );
    Ok(row)
}

/// The caller's own profile.  Private read, scoped by principal.
pub async fn get_own_profile(
    state: &AppState,
    principal: Option<&Principal>,
) -> Result<Option<ProfileRow>, OpError> {
    let principal = require_principal(principal)?;
    let storage = state.storage.lock().await;
    Ok(storage.get_profile_by_owner(&principal.id)?)
}

/// Resolve a profile by username.  Public read, no principal involved.
pub async fn get_profile_by_username(
    state: &AppState,
    username: &str,
) -> Result<Option<ProfileRow>, OpError> {
    let storage = state.storage.lock().await;
    Ok(storage.get_profile_by_username(username)?)
}

/// Update the caller's profile.  `bio` and `image_url` keep their current
/// values when absent from the input.
pub async fn update_profile(
    state: &AppState,
    principal: Option<&Principal>,
    input: ProfileInput,
) -> Result<ProfileRow, OpError> {
    let _guard = ViewGuard::new(&state.invalidator, vec![DASHBOARD_PATH.to_string()]);
    let principal = require_principal(principal)?;
    let input = input.normalized()?;

    let storage = state.storage.lock().await;
    let updated = storage.update_profile(
        &principal.id,
        &input.display_name,
        &input.username,
        input.bio.as_deref(),
        input.image_url.as_deref(),
        now_secs(),
    )?;
    if !updated {
        return Err(OpError::NotFoundOrUnauthorized);
    }
    let row = storage
        .get_profile_by_owner(&principal.id)?
        .ok_or(OpError::NotFoundOrUnauthorized)?;
    drop(storage);

    alog!(
        "profile updated: {} ({})",
        row.username,
        logging::principal_id(&row.owner_id)
    );
    Ok(row)
}
