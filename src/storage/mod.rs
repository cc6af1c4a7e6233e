//! Storage layer for crewsync.
//!
//! SQLite-backed key-value persistence for the offline queue and the auth
//! token, plus an in-memory fallback.

mod database;
mod kv;
mod migrations;

pub use database::Database;
pub use kv::{KeyValueStore, MemoryStore};

use std::rc::Rc;

use tracing::warn;

/// Open the database at `path`, falling back to memory when it is unavailable.
///
/// The handle is shared: the queue and the auth token live in the same store.
#[must_use]
pub fn open_or_memory(path: &std::path::Path) -> Rc<dyn KeyValueStore> {
    match Database::open_at(path) {
        Ok(db) => Rc::new(db),
        Err(e) => {
            warn!(error = %e, "database unavailable, queue will not survive this process");
            Rc::new(MemoryStore::new())
        }
    }
}
