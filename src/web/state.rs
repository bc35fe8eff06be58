//! Shared application state.
//!
//! All long-lived resources are constructed once at startup and injected
//! here; nothing is an ambient singleton.  The SQLite connection sits
//! behind a mutex and the lock is held only across database round trips,
//! never across object-storage or oracle I/O.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::auth::IdentityOracle;
use crate::invalidate::ViewInvalidator;
use crate::object_store::ObjectStore;
use crate::storage::Storage;

pub struct AppState {
    pub storage: Mutex<Storage>,
    pub objects: Arc<dyn ObjectStore>,
    pub oracle: Arc<dyn IdentityOracle>,
    pub invalidator: ViewInvalidator,
}

pub type SharedState = Arc<AppState>;
