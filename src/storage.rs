//! SQLite storage layer for aperture.
//!
//! Holds the relational schema for profiles, albums, and images, plus the
//! per-entity CRUD operations.  Ownership enforcement lives in the WHERE
//! clauses: every owner-scoped mutation matches `id AND owner_id` and
//! reports only whether any row was affected, so callers cannot tell a
//! missing row from someone else's row.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StorageError {
    Sqlite(rusqlite::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Sqlite(e) => write!(f, "sqlite error: {e}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Sqlite(e)
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// Profile row stored in the database.  One per external principal; the
/// username is the public routing key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    pub owner_id: String,
    pub display_name: String,
    pub username: String,
    pub bio: String,
    pub image_url: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Album row stored in the database.  Owned by exactly one principal;
/// joined to profiles by the shared external identity value, not a
/// declared foreign key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub album_order: Option<i64>,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Image row stored in the database.  Belongs to exactly one album;
/// deleting the album cascades here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRow {
    pub id: String,
    pub album_id: String,
    pub image_url: String,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub image_order: Option<i64>,
    pub created_at: u64,
    pub updated_at: u64,
}

// ---------------------------------------------------------------------------
// Storage handle
// ---------------------------------------------------------------------------

/// Main storage handle wrapping a SQLite connection.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open or create a database at the given path. Creates schema if needed.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let storage = Self { conn };
        storage.create_schema()?;
        Ok(storage)
    }

    /// Create an in-memory database.  Used by tests and credential-less
    /// local runs.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let storage = Self { conn };
        storage.create_schema()?;
        Ok(storage)
    }

    fn create_schema(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS profiles (
                id           TEXT PRIMARY KEY,
                owner_id     TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                username     TEXT NOT NULL UNIQUE,
                bio          TEXT NOT NULL DEFAULT 'Welcome to my profile!',
                image_url    TEXT,
                created_at   INTEGER NOT NULL,
                updated_at   INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS albums (
                id           TEXT PRIMARY KEY,
                owner_id     TEXT NOT NULL,
                title        TEXT NOT NULL,
                description  TEXT,
                cover_url    TEXT,
                album_order  INTEGER,
                created_at   INTEGER NOT NULL,
                updated_at   INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_albums_owner
                ON albums(owner_id, album_order);

            CREATE TABLE IF NOT EXISTS images (
                id           TEXT PRIMARY KEY,
                album_id     TEXT NOT NULL REFERENCES albums(id) ON DELETE CASCADE,
                image_url    TEXT NOT NULL,
                alt_text     TEXT,
                caption      TEXT,
                image_order  INTEGER,
                created_at   INTEGER NOT NULL,
                updated_at   INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_images_album
                ON images(album_id, image_order);
            ",
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Profiles CRUD
    // -----------------------------------------------------------------------

    /// Insert a new profile.  Fails on duplicate username or duplicate
    /// owner (both UNIQUE constraints).
    pub fn insert_profile(&self, row: &ProfileRow) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO profiles
             (id, owner_id, display_name, username, bio, image_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.id,
                row.owner_id,
                row.display_name,
                row.username,
                row.bio,
                row.image_url,
                row.created_at as i64,
                row.updated_at as i64,
            ],
        )?;
        Ok(())
    }

    pub fn get_profile_by_owner(&self, owner_id: &str) -> Result<Option<ProfileRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, display_name, username, bio, image_url, created_at, updated_at
             FROM profiles WHERE owner_id = ?1",
        )?;
        let row = stmt
            .query_row(params![owner_id], profile_from_row)
            .optional()?;
        Ok(row)
    }

    /// Resolve a profile by its public username.  The only public lookup key.
    pub fn get_profile_by_username(&self, username: &str) -> Result<Option<ProfileRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, display_name, username, bio, image_url, created_at, updated_at
             FROM profiles WHERE username = ?1",
        )?;
        let row = stmt
            .query_row(params![username], profile_from_row)
            .optional()?;
        Ok(row)
    }

    /// Update the profile owned by `owner_id`.  `bio` and `image_url` keep
    /// their current values when passed as None.  Returns whether a row
    /// was affected.
    pub fn update_profile(
        &self,
        owner_id: &str,
        display_name: &str,
        username: &str,
        bio: Option<&str>,
        image_url: Option<&str>,
        updated_at: u64,
    ) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "UPDATE profiles
             SET display_name = ?1,
                 username     = ?2,
                 bio          = COALESCE(?3, bio),
                 image_url    = COALESCE(?4, image_url),
                 updated_at   = ?5
             WHERE owner_id = ?6",
            params![display_name, username, bio, image_url, updated_at as i64, owner_id],
        )?;
        Ok(affected > 0)
    }

    pub fn count_profiles(&self) -> Result<u64, StorageError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    // -----------------------------------------------------------------------
    // Albums CRUD
    // -----------------------------------------------------------------------

    pub fn insert_album(&self, row: &AlbumRow) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO albums
             (id, owner_id, title, description, cover_url, album_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.id,
                row.owner_id,
                row.title,
                row.description,
                row.cover_url,
                row.album_order,
                row.created_at as i64,
                row.updated_at as i64,
            ],
        )?;
        Ok(())
    }

    pub fn get_album(&self, id: &str) -> Result<Option<AlbumRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, title, description, cover_url, album_order, created_at, updated_at
             FROM albums WHERE id = ?1",
        )?;
        let row = stmt.query_row(params![id], album_from_row).optional()?;
        Ok(row)
    }

    /// List an owner's albums, explicitly-ordered ones first.
    pub fn list_albums_by_owner(&self, owner_id: &str) -> Result<Vec<AlbumRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, title, description, cover_url, album_order, created_at, updated_at
             FROM albums WHERE owner_id = ?1
             ORDER BY album_order IS NULL, album_order ASC, created_at ASC",
        )?;
        let rows = stmt.query_map(params![owner_id], album_from_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Owner-scoped album update.  Zero affected rows means the album does
    /// not exist or belongs to a different owner; callers must not
    /// distinguish the two.
    pub fn update_album(&self, row: &AlbumRow) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "UPDATE albums
             SET title = ?1, description = ?2, cover_url = ?3, album_order = ?4, updated_at = ?5
             WHERE id = ?6 AND owner_id = ?7",
            params![
                row.title,
                row.description,
                row.cover_url,
                row.album_order,
                row.updated_at as i64,
                row.id,
                row.owner_id,
            ],
        )?;
        Ok(affected > 0)
    }

    /// Owner-scoped album delete.  Cascades to the album's images.
    pub fn delete_album(&self, id: &str, owner_id: &str) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "DELETE FROM albums WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
        )?;
        Ok(affected > 0)
    }

    pub fn count_albums(&self) -> Result<u64, StorageError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM albums", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    // -----------------------------------------------------------------------
    // Images CRUD
    // -----------------------------------------------------------------------

    pub fn insert_image(&self, row: &ImageRow) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO images
             (id, album_id, image_url, alt_text, caption, image_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.id,
                row.album_id,
                row.image_url,
                row.alt_text,
                row.caption,
                row.image_order,
                row.created_at as i64,
                row.updated_at as i64,
            ],
        )?;
        Ok(())
    }

    pub fn get_image(&self, id: &str) -> Result<Option<ImageRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, album_id, image_url, alt_text, caption, image_order, created_at, updated_at
             FROM images WHERE id = ?1",
        )?;
        let row = stmt.query_row(params![id], image_from_row).optional()?;
        Ok(row)
    }

    /// List an album's images ascending by display order, unordered ones
    /// last.
    pub fn list_images(&self, album_id: &str) -> Result<Vec<ImageRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, album_id, image_url, alt_text, caption, image_order, created_at, updated_at
             FROM images WHERE album_id = ?1
             ORDER BY image_order IS NULL, image_order ASC, created_at ASC",
        )?;
        let rows = stmt.query_map(params![album_id], image_from_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Update an image, matched on `id AND album_id`.  The album match is
    /// what ties the mutation to the ownership check the caller performed
    /// on the parent album.
    pub fn update_image(&self, row: &ImageRow) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "UPDATE images
             SET image_url = ?1, alt_text = ?2, caption = ?3, image_order = ?4, updated_at = ?5
             WHERE id = ?6 AND album_id = ?7",
            params![
                row.image_url,
                row.alt_text,
                row.caption,
                row.image_order,
                row.updated_at as i64,
                row.id,
                row.album_id,
            ],
        )?;
        Ok(affected > 0)
    }

    /// Delete an image matched on `(image_url, album_id)`.  A caller
    /// supplying a mismatched album id affects zero rows here rather than
    /// deleting an image from someone else's album.
    pub fn delete_image_by_url(&self, image_url: &str, album_id: &str) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "DELETE FROM images WHERE image_url = ?1 AND album_id = ?2",
            params![image_url, album_id],
        )?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Row mapping helpers
// ---------------------------------------------------------------------------

fn profile_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        display_name: row.get(2)?,
        username: row.get(3)?,
        bio: row.get(4)?,
        image_url: row.get(5)?,
        created_at: row.get::<_, i64>(6)? as u64,
        updated_at: row.get::<_, i64>(7)? as u64,
    })
}

fn album_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AlbumRow> {
    Ok(AlbumRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        cover_url: row.get(4)?,
        album_order: row.get(5)?,
        created_at: row.get::<_, i64>(6)? as u64,
        updated_at: row.get::<_, i64>(7)? as u64,
    })
}

fn image_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ImageRow> {
    Ok(ImageRow {
        id: row.get(0)?,
        album_id: row.get(1)?,
        image_url: row.get(2)?,
        alt_text: row.get(3)?,
        caption: row.get(4)?,
        image_order: row.get(5)?,
        created_at: row.get::<_, i64>(6)? as u64,
        updated_at: row.get::<_, i64>(7)? as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_storage() -> Storage {
        Storage::open_in_memory().unwrap()
    }

    fn now_secs() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    fn profile(owner: &str, username: &str) -> ProfileRow {
        let now = now_secs();
        ProfileRow {
            id: format!("profile-{username}"),
            owner_id: owner.to_string(),
            display_name: "Alice".to_string(),
            username: username.to_string(),
            bio: "Welcome to my profile!".to_string(),
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn album(id: &str, owner: &str, title: &str, order: Option<i64>) -> AlbumRow {
        let now = now_secs();
        AlbumRow {
            id: id.to_string(),
            owner_id: owner.to_string(),
            title: title.to_string(),
            description: None,
            cover_url: None,
            album_order: order,
            created_at: now,
            updated_at: now,
        }
    }

    fn image(id: &str, album_id: &str, url: &str, order: Option<i64>) -> ImageRow {
        let now = now_secs();
        ImageRow {
            id: id.to_string(),
            album_id: album_id.to_string(),
            image_url: url.to_string(),
            alt_text: Some("a photo".to_string()),
            caption: Some("a caption".to_string()),
            image_order: order,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_profile_crud() {
        let storage = test_storage();

        assert!(storage.get_profile_by_owner("user-1").unwrap().is_none());

        storage.insert_profile(&profile("user-1", "alice")).unwrap();

        let loaded = storage.get_profile_by_owner("user-1").unwrap().unwrap();
        assert_eq!(loaded.username, "alice");
        assert_eq!(loaded.bio, "Welcome to my profile!");

        let by_name = storage.get_profile_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.owner_id, "user-1");

        // Update with bio None keeps the existing bio.
        let updated = storage
            .update_profile("user-1", "Alice B", "aliceb", None, None, now_secs() + 5)
            .unwrap();
        assert!(updated);
        let loaded = storage.get_profile_by_owner("user-1").unwrap().unwrap();
        assert_eq!(loaded.display_name, "Alice B");
        assert_eq!(loaded.username, "aliceb");
        assert_eq!(loaded.bio, "Welcome to my profile!");

        // Updating a profile that does not exist affects nothing.
        assert!(!storage
            .update_profile("ghost", "X", "x", None, None, now_secs())
            .unwrap());
    }

    #[test]
    fn test_username_unique_constraint() {
        let storage = test_storage();
        storage.insert_profile(&profile("user-1", "alice")).unwrap();

        let result = storage.insert_profile(&profile("user-2", "alice"));
        assert!(matches!(result, Err(StorageError::Sqlite(_))));
    }

    #[test]
    fn test_one_profile_per_owner() {
        let storage = test_storage();
        storage.insert_profile(&profile("user-1", "alice")).unwrap();
        assert!(storage.insert_profile(&profile("user-1", "alice2")).is_err());
    }

    #[test]
    fn test_album_crud_owner_scoped() {
        let storage = test_storage();
        storage.insert_album(&album("alb-1", "user-1", "Summer", Some(1))).unwrap();

        let loaded = storage.get_album("alb-1").unwrap().unwrap();
        assert_eq!(loaded.title, "Summer");
        assert_eq!(loaded.owner_id, "user-1");

        // Update by a different owner affects zero rows and leaves the row
        // untouched.
        let mut hijack = loaded.clone();
        hijack.owner_id = "user-2".to_string();
        hijack.title = "Stolen".to_string();
        assert!(!storage.update_album(&hijack).unwrap());
        assert_eq!(storage.get_album("alb-1").unwrap().unwrap().title, "Summer");

        // Update by the owner succeeds.
        let mut mine = loaded.clone();
        mine.title = "Summer 2026".to_string();
        assert!(storage.update_album(&mine).unwrap());
        assert_eq!(
            storage.get_album("alb-1").unwrap().unwrap().title,
            "Summer 2026"
        );

        // Delete by a different owner affects zero rows.
        assert!(!storage.delete_album("alb-1", "user-2").unwrap());
        assert!(storage.get_album("alb-1").unwrap().is_some());

        assert!(storage.delete_album("alb-1", "user-1").unwrap());
        assert!(storage.get_album("alb-1").unwrap().is_none());
    }

    #[test]
    fn test_album_list_ordering() {
        let storage = test_storage();
        storage.insert_album(&album("alb-b", "user-1", "B", Some(2))).unwrap();
        storage.insert_album(&album("alb-a", "user-1", "A", Some(1))).unwrap();
        storage.insert_album(&album("alb-c", "user-1", "C", None)).unwrap();
        storage.insert_album(&album("alb-x", "user-2", "X", Some(0))).unwrap();

        let albums = storage.list_albums_by_owner("user-1").unwrap();
        let ids: Vec<&str> = albums.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["alb-a", "alb-b", "alb-c"]);
    }

    #[test]
    fn test_album_delete_cascades_to_images() {
        let storage = test_storage();
        storage.insert_album(&album("alb-1", "user-1", "Summer", None)).unwrap();
        storage
            .insert_image(&image("img-1", "alb-1", "https://cdn/alb-1-1-a.png", Some(1)))
            .unwrap();
        storage
            .insert_image(&image("img-2", "alb-1", "https://cdn/alb-1-2-b.png", Some(2)))
            .unwrap();

        assert_eq!(storage.list_images("alb-1").unwrap().len(), 2);

        assert!(storage.delete_album("alb-1", "user-1").unwrap());
        assert!(storage.list_images("alb-1").unwrap().is_empty());
        assert!(storage.get_image("img-1").unwrap().is_none());
    }

    #[test]
    fn test_image_ordering() {
        let storage = test_storage();
        storage.insert_album(&album("alb-1", "user-1", "Summer", None)).unwrap();
        storage
            .insert_image(&image("img-3", "alb-1", "https://cdn/c.png", Some(3)))
            .unwrap();
        storage
            .insert_image(&image("img-1", "alb-1", "https://cdn/a.png", Some(1)))
            .unwrap();
        storage
            .insert_image(&image("img-2", "alb-1", "https://cdn/b.png", Some(2)))
            .unwrap();

        let images = storage.list_images("alb-1").unwrap();
        let ids: Vec<&str> = images.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["img-1", "img-2", "img-3"]);
    }

    #[test]
    fn test_image_requires_existing_album() {
        let storage = test_storage();
        let result = storage.insert_image(&image("img-1", "no-such-album", "https://cdn/a.png", None));
        assert!(result.is_err());
    }

    #[test]
    fn test_update_image_rematches_album() {
        let storage = test_storage();
        storage.insert_album(&album("alb-1", "user-1", "Summer", None)).unwrap();
        storage.insert_album(&album("alb-2", "user-1", "Winter", None)).unwrap();
        storage
            .insert_image(&image("img-1", "alb-1", "https://cdn/a.png", Some(1)))
            .unwrap();

        // A mismatched album id affects zero rows and leaves the image
        // untouched.
        let mut moved = storage.get_image("img-1").unwrap().unwrap();
        moved.album_id = "alb-2".to_string();
        moved.caption = Some("moved".to_string());
        assert!(!storage.update_image(&moved).unwrap());
        let loaded = storage.get_image("img-1").unwrap().unwrap();
        assert_eq!(loaded.album_id, "alb-1");
        assert_eq!(loaded.caption, Some("a caption".to_string()));

        // The matching pair updates.
        let mut mine = storage.get_image("img-1").unwrap().unwrap();
        mine.caption = Some("updated caption".to_string());
        mine.image_order = Some(5);
        assert!(storage.update_image(&mine).unwrap());
        let loaded = storage.get_image("img-1").unwrap().unwrap();
        assert_eq!(loaded.caption, Some("updated caption".to_string()));
        assert_eq!(loaded.image_order, Some(5));
    }

    #[test]
    fn test_delete_image_by_url_two_part_match() {
        let storage = test_storage();
        storage.insert_album(&album("alb-1", "user-1", "Summer", None)).unwrap();
        storage.insert_album(&album("alb-2", "user-1", "Winter", None)).unwrap();
        storage
            .insert_image(&image("img-1", "alb-1", "https://cdn/alb-1-1-a.png", None))
            .unwrap();

        // Right URL, wrong album: zero rows.
        assert!(!storage
            .delete_image_by_url("https://cdn/alb-1-1-a.png", "alb-2")
            .unwrap());
        assert!(storage.get_image("img-1").unwrap().is_some());

        // Matching pair deletes.
        assert!(storage
            .delete_image_by_url("https://cdn/alb-1-1-a.png", "alb-1")
            .unwrap());
        assert!(storage.get_image("img-1").unwrap().is_none());
    }
}
