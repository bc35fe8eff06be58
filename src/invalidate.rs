//! View invalidation: advisory "your cached render is stale" signals.
//!
//! A process-wide broadcast channel keyed by view-path strings.  Sends are
//! fire-and-forget: no acknowledgement, no ordering across concurrent
//! signals, no persistence, and a send with no subscribers is fine.
//!
//! Mutating operations arm a [`ViewGuard`] before touching the database.
//! The guard fires its paths when dropped, so invalidation happens on every
//! exit path; a partially-failed write may still have changed what a
//! dependent view should show.

use tokio::sync::broadcast;

/// Dashboard view path, invalidated by every mutation.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// View path for one album's page.
pub fn album_path(album_id: &str) -> String {
    format!("/albums/{album_id}")
}

/// Process-wide invalidation fan-out.
#[derive(Clone)]
pub struct ViewInvalidator {
    tx: broadcast::Sender<String>,
}

impl ViewInvalidator {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Signal that any cached render of `path` must refetch.
    pub fn invalidate(&self, path: &str) {
        let _ = self.tx.send(path.to_string());
    }
}

/// Fires a fixed set of view paths when dropped.
pub struct ViewGuard<'a> {
    invalidator: &'a ViewInvalidator,
    paths: Vec<String>,
}

impl<'a> ViewGuard<'a> {
    pub fn new(invalidator: &'a ViewInvalidator, paths: Vec<String>) -> Self {
        Self { invalidator, paths }
    }

    /// Add a path discovered mid-operation (e.g. an album id loaded from
    /// the row being mutated).
    pub fn push(&mut self, path: String) {
        self.paths.push(path);
    }
}

impl Drop for ViewGuard<'_> {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            self.invalidator.invalidate(&path);
        }
    }
}
