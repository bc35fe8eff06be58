//! Album operations.
//!
//! Albums are owned by exactly one principal.  Mutations match
//! `id AND owner_id`; a zero-row result surfaces as the combined
//! not-found-or-unauthorized error.  Deleting an album cascades its image
//! rows and then bulk-deletes the stored binaries under the album's key
//! prefix.  The relational delete is not rolled back if the storage step
//! fails.

use uuid::Uuid;

use crate::alog;
use crate::auth::Principal;
use crate::error::OpError;
use crate::invalidate::{album_path, ViewGuard, DASHBOARD_PATH};
use crate::logging;
use crate::ops::{now_secs, require_principal};
use crate::storage::AlbumRow;
use crate::validate::AlbumInput;
use crate::web::state::AppState;

pub async fn create_album(
    state: &AppState,
    principal: Option<&Principal>,
    input: AlbumInput,
) -> Result<AlbumRow, OpError> {
    let mut guard = ViewGuard::new(&state.invalidator, vec![DASHBOARD_PATH.to_string()]);
    let principal = require_principal(principal)?;
    let input = input.normalized()?;

    let now = now_secs();
    let row = AlbumRow {
        id: Uuid::new_v4().to_string(),
        owner_id: principal.id.clone(),
        title: input.title,
        description: input.description,
        cover_url: input.cover_url,
        album_order: input.album_order,
        created_at: now,
        updated_at: now,
    };
    guard.push(album_path(&row.id));

    let storage = state.storage.lock().await;
    storage.insert_album(&row)?;
    drop(storage);

    alog!(
        "album created: {} ({})",
        logging::album_id(&row.id),
        logging::principal_id(&row.owner_id)
    );
    Ok(row)
}

/// Fetch one album.  Public read.
pub async fn get_album(state: &AppState, id: &str) -> Result<Option<AlbumRow>, OpError> {
    let storage = state.storage.lock().await;
    Ok(storage.get_album(id)?)
}

/// List an owner's albums.  Public read; this is what a visitor's profile
/// page renders.
pub async fn get_albums(state: &AppState, owner_id: &str) -> Result<Vec<AlbumRow>, OpError> {
    let storage = state.storage.lock().await;
    Ok(storage.list_albums_by_owner(owner_id)?)
}

pub async fn update_album(
    state: &AppState,
    principal: Option<&Principal>,
    id: &str,
    input: AlbumInput,
) -> Result<AlbumRow, OpError> {
    let _guard = ViewGuard::new(
        &state.invalidator,
        vec![DASHBOARD_PATH.to_string(), album_path(id)],
    );
    let principal = require_principal(principal)?;
    let input = input.normalized()?;

    let row = AlbumRow {
        id: id.to_string(),
        owner_id: principal.id.clone(),
        title: input.title,
        description: input.description,
        cover_url: input.cover_url,
        album_order: input.album_order,
        created_at: 0, // not part of the UPDATE
        updated_at: now_secs(),
    };

    let storage = state.storage.lock().await;
    if !storage.update_album(&row)? {
        return Err(OpError::NotFoundOrUnauthorized);
    }
    let row = storage
        .get_album(id)?
        .ok_or(OpError::NotFoundOrUnauthorized)?;
    drop(storage);

    alog!("album updated: {}", logging::album_id(id));
    Ok(row)
}

/// Delete an album, its image rows (cascade), and its stored binaries.
///
/// The storage bulk delete runs after the relational delete and its
/// failure propagates, but the row is already gone: a failure here leaves
/// orphaned binaries, never a dangling database reference.
pub async fn delete_album(
    state: &AppState,
    principal: Option<&Principal>,
    id: &str,
) -> Result<(), OpError> {
    let _guard = ViewGuard::new(
        &state.invalidator,
        vec![DASHBOARD_PATH.to_string(), album_path(id)],
    );
    let principal = require_principal(principal)?;

    let storage = state.storage.lock().await;
    let deleted = storage.delete_album(id, &principal.id)?;
    drop(storage);

    if !deleted {
        return Err(OpError::NotFoundOrUnauthorized);
    }

    // The `{album_id}-` key prefix is the only record of which binaries
    // belonged to this album.
    let prefix = format!("{id}-");
    match state.objects.delete_prefix(&prefix).await {
        Ok(removed) => {
            alog!(
                "album deleted: {} ({} object(s) removed)",
                logging::album_id(id),
                removed
            );
            Ok(())
        }
        Err(e) => {
            alog!(
                "album deleted: {} but storage cleanup failed, binaries under '{}' are orphaned: {}",
                logging::album_id(id),
                prefix,
                e
            );
            Err(OpError::Storage(e))
        }
    }
}
