//! Image operations.
//!
//! Images have no owner column; authorization is derived through the
//! parent album.  Every mutation first loads the album named by the caller
//! and checks its owner, and the row-level WHERE clauses re-match on the
//! album id so a caller-supplied album id that does not match the image's
//! actual parent affects zero rows.

use uuid::Uuid;

use crate::alog;
use crate::auth::Principal;
use crate::error::OpError;
use crate::invalidate::{album_path, ViewGuard, DASHBOARD_PATH};
use crate::logging;
use crate::object_store::object_key_from_url;
use crate::ops::{now_secs, require_principal};
use crate::storage::ImageRow;
use crate::validate::ImageInput;
use crate::web::state::AppState;

pub async fn create_image(
    state: &AppState,
    principal: Option<&Principal>,
    album_id: &str,
    input: ImageInput,
) -> Result<ImageRow, OpError> {
    let _guard = ViewGuard::new(
        &state.invalidator,
        vec![DASHBOARD_PATH.to_string(), album_path(album_id)],
    );
    let principal = require_principal(principal)?;
    let input = input.normalized()?;

    let now = now_secs();
    let row = ImageRow {
        id: Uuid::new_v4().to_string(),
        album_id: album_id.to_string(),
        image_url: input.image_url,
        alt_text: Some(input.alt_text),
        caption: Some(input.caption),
        image_order: Some(input.image_order),
        created_at: now,
        updated_at: now,
    };

    let storage = state.storage.lock().await;
    owner_of_album(&storage, album_id, principal)?;
    storage.insert_image(&row)?;
    drop(storage);

    alog!("image added to {}", logging::album_id(album_id));
    Ok(row)
}

/// List an album's images ascending by display order.  Public read.
pub async fn get_images(state: &AppState, album_id: &str) -> Result<Vec<ImageRow>, OpError> {
    let storage = state.storage.lock().await;
    Ok(storage.list_images(album_id)?)
}

pub async fn update_image(
    state: &AppState,
    principal: Option<&Principal>,
    image_id: &str,
    input: ImageInput,
) -> Result<ImageRow, OpError> {
    // The album path is unknown until the image row is loaded; it is
    // pushed onto the guard once it is.
    let mut guard = ViewGuard::new(&state.invalidator, vec![DASHBOARD_PATH.to_string()]);
    let principal = require_principal(principal)?;

    let storage = state.storage.lock().await;
    let existing = storage
        .get_image(image_id)?
        .ok_or(OpError::NotFoundOrUnauthorized)?;
    guard.push(album_path(&existing.album_id));
    owner_of_album(&storage, &existing.album_id, principal)?;

    let input = input.normalized()?;
    let row = ImageRow {
        id: existing.id.clone(),
        album_id: existing.album_id.clone(),
        image_url: input.image_url,
        alt_text: Some(input.alt_text),
        caption: Some(input.caption),
        image_order: Some(input.image_order),
        created_at: existing.created_at,
        updated_at: now_secs(),
    };
    if !storage.update_image(&row)? {
        return Err(OpError::NotFoundOrUnauthorized);
    }
    drop(storage);

    alog!("image updated in {}", logging::album_id(&row.album_id));
    Ok(row)
}

/// Delete one image's stored binary and, when `also_delete_row` is set,
/// its database row.
///
/// The binary goes first.  The row delete matches `(image_url, album_id)`:
/// a mismatched album id affects zero rows and fails loudly instead of
/// touching an image in someone else's album.
pub async fn delete_image(
    state: &AppState,
    principal: Option<&Principal>,
    image_url: &str,
    album_id: &str,
    also_delete_row: bool,
) -> Result<(), OpError> {
    let _guard = ViewGuard::new(
        &state.invalidator,
        vec![DASHBOARD_PATH.to_string(), album_path(album_id)],
    );
    let principal = require_principal(principal)?;

    let storage = state.storage.lock().await;
    owner_of_album(&storage, album_id, principal)?;
    drop(storage);

    let key = object_key_from_url(image_url)
        .ok_or_else(|| OpError::Storage(format!("not an object URL: {image_url}")))?;
    state
        .objects
        .delete_object(key)
        .await
        .map_err(OpError::Storage)?;

    if also_delete_row {
        let storage = state.storage.lock().await;
        if !storage.delete_image_by_url(image_url, album_id)? {
            return Err(OpError::NotFoundOrUnauthorized);
        }
    }

    alog!("image deleted from {}", logging::album_id(album_id));
    Ok(())
}

/// Check that `principal` owns `album_id`.  A missing album and a foreign
/// album produce the same error.
fn owner_of_album(
    storage: &crate::storage::Storage,
    album_id: &str,
    principal: &Principal,
) -> Result<(), OpError> {
    match storage.get_album(album_id)? {
        Some(album) if album.owner_id == principal.id => Ok(()),
        _ => Err(OpError::NotFoundOrUnauthorized),
    }
}
