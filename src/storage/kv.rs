//! Durable key-value storage.
//!
//! The queue and the auth token each live under one string key. `Database`
//! is the durable implementation; `MemoryStore` is the fallback used when the
//! database cannot be opened, and the store used by tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::CrewsyncError;

/// String-keyed storage of string values.
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, CrewsyncError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), CrewsyncError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn delete(&self, key: &str) -> Result<(), CrewsyncError>;

    /// Whether values survive the process.
    fn is_durable(&self) -> bool {
        true
    }
}

impl KeyValueStore for Database {
    fn read(&self, key: &str) -> Result<Option<String>, CrewsyncError> {
        self.connection()
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| CrewsyncError::Database(format!("Failed to read {key}: {e}")))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CrewsyncError> {
        self.connection()
            .execute(
                r"INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                  ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                 updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(|e| CrewsyncError::Database(format!("Failed to write {key}: {e}")))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CrewsyncError> {
        self.connection()
            .execute("DELETE FROM kv_store WHERE key = ?1", [key])
            .map_err(|e| CrewsyncError::Database(format!("Failed to delete {key}: {e}")))?;
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Rc<T> {
    fn read(&self, key: &str) -> Result<Option<String>, CrewsyncError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CrewsyncError> {
        (**self).write(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), CrewsyncError> {
        (**self).delete(key)
    }

    fn is_durable(&self) -> bool {
        (**self).is_durable()
    }
}

/// In-process store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, CrewsyncError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CrewsyncError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CrewsyncError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }
}
