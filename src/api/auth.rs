//! Backend auth token storage.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::error::CrewsyncError;
use crate::storage::KeyValueStore;

/// Storage key holding the bearer token.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Environment variable overriding the stored token.
pub const TOKEN_ENV: &str = "CREWSYNC_TOKEN";

/// Bearer token persisted next to the queue.
///
/// A token supplied through the environment takes precedence and is never
/// written to storage.
#[derive(Clone)]
pub struct TokenStore {
    storage: Rc<dyn KeyValueStore>,
    override_token: Option<String>,
}

impl TokenStore {
    /// Token store over `storage`, with an optional override.
    #[must_use]
    pub fn new(storage: Rc<dyn KeyValueStore>, override_token: Option<String>) -> Self {
        Self {
            storage,
            override_token: override_token.filter(|t| !t.is_empty()),
        }
    }

    /// Current token, if any.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        if let Some(token) = &self.override_token {
            return Some(token.clone());
        }
        match self.storage.read(AUTH_TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "could not read auth token");
                None
            }
        }
    }

    /// Whether the token comes from the environment.
    #[must_use]
    pub const fn is_overridden(&self) -> bool {
        self.override_token.is_some()
    }

    /// Persist `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be written.
    pub fn save(&self, token: &str) -> Result<(), CrewsyncError> {
        self.storage.write(AUTH_TOKEN_KEY, token)?;
        debug!("auth token saved");
        Ok(())
    }

    /// Delete the stored token.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn clear(&self) -> Result<(), CrewsyncError> {
        self.storage.delete(AUTH_TOKEN_KEY)
    }

    /// Drop the stored token after the backend refused it.
    pub fn discard(&self) {
        if let Err(e) = self.clear() {
            warn!(error = %e, "could not discard rejected auth token");
        } else {
            warn!("backend rejected the auth token, log in again");
        }
    }
}
