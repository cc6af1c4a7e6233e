//! Shared state for command execution.
//!
//! Opens storage once and builds the backend client, token store and offline
//! session from configuration.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::api::{delivery_handlers, ApiClient, HttpProbe, TokenStore, TOKEN_ENV};
use crate::config::{Config, Paths};
use crate::offline::{ConnectivitySource, FixedConnectivity, OfflineSession, QueueStore};
use crate::storage::{open_or_memory, KeyValueStore};

/// Everything a command needs to run.
pub struct Context {
    config: Config,
    storage: Rc<dyn KeyValueStore>,
    client: Rc<ApiClient>,
    offline: bool,
}

impl Context {
    /// Open storage under `paths` and build the client.
    ///
    /// Storage problems are not fatal: the queue falls back to memory.
    #[must_use]
    pub fn open(paths: &Paths, config: Config, offline: bool) -> Self {
        if let Err(e) = paths.ensure_dirs() {
            warn!(error = %e, "could not create data directory");
        }
        let storage = open_or_memory(&paths.database);
        Self::with_storage(storage, config, offline)
    }

    /// Build a context over existing storage.
    #[must_use]
    pub fn with_storage(storage: Rc<dyn KeyValueStore>, config: Config, offline: bool) -> Self {
        let tokens = TokenStore::new(Rc::clone(&storage), std::env::var(TOKEN_ENV).ok());
        let client = Rc::new(ApiClient::from_config(&config.api, tokens));

        Self {
            config,
            storage,
            client,
            offline,
        }
    }

    /// Loaded configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Backend client.
    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Load the queue without touching the network.
    #[must_use]
    pub fn store(&self) -> QueueStore {
        QueueStore::load(Box::new(Rc::clone(&self.storage)), self.config.queue.limits())
    }

    /// Connectivity source: the HTTP probe, or pinned offline.
    #[must_use]
    pub fn connectivity(&self) -> Box<dyn ConnectivitySource> {
        if self.offline {
            debug!("offline mode, backend will not be contacted");
            Box::new(FixedConnectivity(false))
        } else {
            Box::new(HttpProbe::from_config(&self.config.api))
        }
    }

    /// Start an offline session. Probes the backend unless running offline.
    #[must_use]
    pub fn session(&self) -> OfflineSession {
        OfflineSession::new(
            self.store(),
            delivery_handlers(&self.client),
            self.connectivity(),
            self.config.queue.drain_policy,
        )
    }
}
