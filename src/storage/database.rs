//! `SQLite` database connection.
//!
//! The database normally lives at `~/.crewsync/crewsync.db` and holds a single
//! key-value table used for the offline queue and the auth token.

use rusqlite::Connection;

use crate::error::CrewsyncError;

use super::migrations;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at a specific path, running migrations if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_at(path: &std::path::Path) -> Result<Self, CrewsyncError> {
        let conn = Connection::open(path).map_err(|e| {
            CrewsyncError::Database(format!("Failed to open database {}: {e}", path.display()))
        })?;

        let db = Self { conn };
        db.migrate()?;

        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self, CrewsyncError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            CrewsyncError::Database(format!("Failed to open in-memory database: {e}"))
        })?;

        let db = Self { conn };
        db.migrate()?;

        Ok(db)
    }

    fn migrate(&self) -> Result<(), CrewsyncError> {
        migrations::run(&self.conn)
    }

    /// Get a reference to the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(db: &Database) -> i32 {
        migrations::get_version(db.connection()).unwrap()
    }

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        assert!(version(&db) > 0);
    }

    #[test]
    fn test_open_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db = Database::open_at(&db_path).unwrap();
        assert!(version(&db) > 0);
        assert!(db_path.exists());
    }

    #[test]
    fn test_reopen_database() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        {
            let db = Database::open_at(&db_path).unwrap();
            assert!(version(&db) > 0);
        }

        // Reopen - migrations are already applied
        let db = Database::open_at(&db_path).unwrap();
        assert!(version(&db) > 0);
    }

    #[test]
    fn test_open_in_missing_directory_fails() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("missing").join("test.db");

        assert!(matches!(
            Database::open_at(&db_path),
            Err(CrewsyncError::Database(_))
        ));
    }
}
