//! Durable ordered queue of deferred actions.
//!
//! The whole sequence is stored as one JSON array under a single key and is
//! rewritten after every mutation. Storage problems never escape this type:
//! reads fall back to an empty queue and failed writes leave the in-memory
//! queue authoritative, reported through [`Durability`]. When the stored queue
//! cannot be read at all, nothing is written back for the rest of the session
//! so the unread actions survive.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::action::{ActionKind, QueuedAction};
use crate::storage::KeyValueStore;

/// Storage key holding the queue.
pub const QUEUE_KEY: &str = "queuedSubmissions";

/// Storage key receiving unreadable queue contents. Later backups go to
/// `queuedSubmissions.corrupt.1`, `.2` and so on.
pub const CORRUPT_KEY: &str = "queuedSubmissions.corrupt";

/// Whether the current queue contents reached durable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    /// The last write succeeded against durable storage.
    Persisted,
    /// The queue only exists in this process.
    MemoryOnly,
}

/// Optional bounds on queue growth. Both unset means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueLimits {
    /// Keep at most this many actions, evicting the oldest.
    pub max_items: Option<usize>,
    /// Drop actions older than this when the queue is loaded.
    pub max_age: Option<chrono::Duration>,
}

/// Result of [`QueueStore::enqueue`].
#[derive(Debug, Clone)]
pub struct Enqueued {
    /// The record that was appended.
    pub action: QueuedAction,
    /// Whether it reached durable storage.
    pub durability: Durability,
}

/// Ordered holding area for actions awaiting delivery.
pub struct QueueStore {
    storage: Box<dyn KeyValueStore>,
    actions: Vec<QueuedAction>,
    limits: QueueLimits,
    durability: Durability,
    writable: bool,
}

impl QueueStore {
    /// Load the persisted queue, starting empty if there is none or it is unreadable.
    #[must_use]
    pub fn load(storage: Box<dyn KeyValueStore>, limits: QueueLimits) -> Self {
        let (actions, writable) = match read_queue(storage.as_ref()) {
            Some(actions) => (actions, true),
            None => (Vec::new(), false),
        };
        let durability = if writable && storage.is_durable() {
            Durability::Persisted
        } else {
            Durability::MemoryOnly
        };

        let mut store = Self {
            storage,
            actions,
            limits,
            durability,
            writable,
        };

        if store.evict_expired(Utc::now()) > 0 {
            store.persist();
        }

        debug!(count = store.actions.len(), "loaded offline queue");
        store
    }

    /// Append a new action and persist the queue.
    pub fn enqueue(&mut self, kind: ActionKind, payload: Value) -> Enqueued {
        self.append(QueuedAction::new(kind, payload))
    }

    /// Append an already built action, keeping its ID.
    ///
    /// Used when an immediate delivery failed, so a later retry carries the
    /// same idempotency key.
    pub fn append(&mut self, action: QueuedAction) -> Enqueued {
        if self.actions.iter().any(|a| a.id == action.id) {
            warn!(id = %action.id, "action already queued");
            return Enqueued {
                action,
                durability: self.durability,
            };
        }

        self.actions.push(action.clone());
        self.evict_overflow();

        let durability = self.persist();
        debug!(id = %action.id, kind = action.kind.as_str(), "queued action");

        Enqueued { action, durability }
    }

    /// Current queue, oldest first.
    #[must_use]
    pub fn all(&self) -> &[QueuedAction] {
        &self.actions
    }

    /// Number of queued actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Oldest queued action, if any.
    #[must_use]
    pub fn oldest(&self) -> Option<&QueuedAction> {
        self.actions.first()
    }

    /// Durability of the current contents.
    #[must_use]
    pub const fn durability(&self) -> Durability {
        self.durability
    }

    /// Remove every action whose ID is in `ids`, keeping the rest in order.
    ///
    /// Returns the number of actions removed.
    pub fn remove(&mut self, ids: &HashSet<String>) -> usize {
        let before = self.actions.len();
        self.actions.retain(|a| !ids.contains(&a.id));
        let removed = before - self.actions.len();

        if removed > 0 {
            self.persist();
        }
        removed
    }

    /// Drop everything and persist the empty queue.
    pub fn clear(&mut self) {
        self.actions.clear();
        self.persist();
    }

    /// Write the whole sequence to storage.
    fn persist(&mut self) -> Durability {
        if !self.writable {
            debug!(count = self.actions.len(), "stored queue was unreadable, keeping queue in memory");
            self.durability = Durability::MemoryOnly;
            return self.durability;
        }

        let written = serde_json::to_string(&self.actions)
            .map_err(crate::error::CrewsyncError::from)
            .and_then(|json| self.storage.write(QUEUE_KEY, &json));

        self.durability = match written {
            Ok(()) if self.storage.is_durable() => Durability::Persisted,
            Ok(()) => Durability::MemoryOnly,
            Err(e) => {
                warn!(error = %e, count = self.actions.len(), "failed to persist offline queue");
                Durability::MemoryOnly
            }
        };
        self.durability
    }

    fn evict_overflow(&mut self) {
        let Some(max) = self.limits.max_items else {
            return;
        };
        let max = max.max(1);

        if self.actions.len() > max {
            let excess = self.actions.len() - max;
            for evicted in self.actions.drain(..excess) {
                warn!(id = %evicted.id, kind = evicted.kind.as_str(), "queue full, evicted oldest action");
            }
        }
    }

    fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        let Some(max_age) = self.limits.max_age else {
            return 0;
        };
        let Some(cutoff) = now.checked_sub_signed(max_age) else {
            return 0;
        };

        let before = self.actions.len();
        self.actions.retain(|a| {
            let keep = a.enqueued_at >= cutoff;
            if !keep {
                warn!(id = %a.id, kind = a.kind.as_str(), enqueued_at = %a.enqueued_at, "dropped expired action");
            }
            keep
        });
        before - self.actions.len()
    }
}

/// Read the persisted queue. `None` means storage could not be read, so its
/// contents are unknown.
fn read_queue(storage: &dyn KeyValueStore) -> Option<Vec<QueuedAction>> {
    let raw = match storage.read(QUEUE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Some(Vec::new()),
        Err(e) => {
            warn!(error = %e, "failed to read offline queue, new actions stay in memory");
            return None;
        }
    };

    let actions: Vec<QueuedAction> = match serde_json::from_str(&raw) {
        Ok(actions) => actions,
        Err(e) => {
            let key = backup_key(storage);
            warn!(error = %e, backup = %key, "offline queue is corrupt, starting empty");
            if let Err(e) = storage.write(&key, &raw) {
                warn!(error = %e, "failed to back up corrupt offline queue");
            }
            return Some(Vec::new());
        }
    };

    // IDs must be unique for removal to be exact; keep the first occurrence.
    let mut seen = HashSet::new();
    Some(
        actions
            .into_iter()
            .filter(|a| {
                let fresh = seen.insert(a.id.clone());
                if !fresh {
                    warn!(id = %a.id, "dropped duplicate queued action");
                }
                fresh
            })
            .collect(),
    )
}

/// First backup key not already holding an earlier backup.
fn backup_key(storage: &dyn KeyValueStore) -> String {
    let taken = |key: &str| matches!(storage.read(key), Ok(Some(_)));
    if !taken(CORRUPT_KEY) {
        return CORRUPT_KEY.to_string();
    }
    (1..)
        .map(|n| format!("{CORRUPT_KEY}.{n}"))
        .find(|key| !taken(key))
        .unwrap_or_else(|| CORRUPT_KEY.to_string())
}
