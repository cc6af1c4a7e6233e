//! Offline session: the queue as the rest of the application sees it.
//!
//! Ties together the store, the connectivity monitor, the drainer and the
//! delivery handlers. Feature flows call [`OfflineSession::submit`]; status
//! displays read [`OfflineSession::all`] and [`OfflineSession::is_online`].

use serde_json::Value;
use tracing::debug;

use super::action::{ActionKind, QueuedAction};
use super::connectivity::{ConnectivityMonitor, ConnectivitySource, Transition};
use super::delivery::{DeliveryError, HandlerRegistry};
use super::drainer::{DrainOutcome, DrainPolicy, QueueDrainer};
use super::store::{Enqueued, QueueStore};

/// Why a submission was queued instead of delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueReason {
    /// The backend was unreachable.
    Offline,
    /// The caller asked to defer delivery.
    Deferred,
    /// Older actions are still queued and were not all delivered.
    Backlog,
    /// The immediate attempt failed with a retryable error.
    DeliveryFailed(DeliveryError),
}

/// Result of [`OfflineSession::submit`].
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The backend accepted the action.
    Delivered(QueuedAction),
    /// The action is waiting in the queue.
    Queued {
        /// The queued record
        enqueued: Enqueued,
        /// Why it was not delivered
        reason: QueueReason,
    },
    /// The backend can never accept the action; it was not queued.
    Rejected {
        /// The action that was refused
        action: QueuedAction,
        /// Why it was refused
        error: DeliveryError,
    },
}

/// What [`OfflineSession::refresh`] observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refresh {
    /// Reachability change, if any
    pub transition: Option<Transition>,
    /// Drain triggered by the change, if any
    pub drain: Option<DrainOutcome>,
}

/// The offline queue plus everything needed to replay it.
pub struct OfflineSession {
    store: QueueStore,
    monitor: ConnectivityMonitor,
    drainer: QueueDrainer,
    handlers: HandlerRegistry,
    source: Box<dyn ConnectivitySource>,
}

impl OfflineSession {
    /// Start a session, reading initial reachability from `source`.
    #[must_use]
    pub fn new(
        store: QueueStore,
        handlers: HandlerRegistry,
        source: Box<dyn ConnectivitySource>,
        policy: DrainPolicy,
    ) -> Self {
        let monitor = ConnectivityMonitor::new(source.as_ref());
        debug!(
            online = monitor.is_reachable(),
            queued = store.len(),
            "offline session started"
        );

        Self {
            store,
            monitor,
            drainer: QueueDrainer::new(policy),
            handlers,
            source,
        }
    }

    /// Last known reachability.
    #[must_use]
    pub const fn is_online(&self) -> bool {
        self.monitor.is_reachable()
    }

    /// Queued actions, oldest first.
    #[must_use]
    pub fn all(&self) -> &[QueuedAction] {
        self.store.all()
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &QueueStore {
        &self.store
    }

    /// The connectivity monitor, for subscribing to transitions.
    pub fn monitor_mut(&mut self) -> &mut ConnectivityMonitor {
        &mut self.monitor
    }

    /// Defer an action unconditionally.
    pub fn enqueue(&mut self, kind: ActionKind, payload: Value) -> Enqueued {
        self.store.enqueue(kind, payload)
    }

    /// Discard every queued action.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Run a drain pass now ("sync now").
    pub fn trigger_drain(&mut self) -> DrainOutcome {
        self.drainer
            .drain(&mut self.store, &self.handlers, self.monitor.is_reachable())
    }

    /// Poll the connectivity source; drain if the backend just came back.
    pub fn refresh(&mut self) -> Refresh {
        let transition = self.monitor.poll(self.source.as_ref());

        let drain = match transition {
            Some(Transition::Online) if !self.store.is_empty() => Some(self.trigger_drain()),
            _ => None,
        };

        Refresh { transition, drain }
    }

    /// Deliver an action now if possible, otherwise queue it.
    ///
    /// When older actions are still queued the new one goes behind them and a
    /// drain runs, so submissions never overtake the queue.
    pub fn submit(&mut self, kind: ActionKind, payload: Value, defer: bool) -> SubmitOutcome {
        let action = QueuedAction::new(kind, payload);

        if defer {
            return self.queue(action, QueueReason::Deferred);
        }
        if !self.monitor.is_reachable() {
            return self.queue(action, QueueReason::Offline);
        }

        if !self.store.is_empty() {
            let enqueued = self.store.append(action);
            let outcome = self.trigger_drain();
            let delivered = outcome
                .report()
                .is_some_and(|r| r.delivered.contains(&enqueued.action.id));

            return if delivered {
                SubmitOutcome::Delivered(enqueued.action)
            } else {
                SubmitOutcome::Queued {
                    enqueued,
                    reason: QueueReason::Backlog,
                }
            };
        }

        match self.handlers.deliver(&action) {
            Ok(()) => SubmitOutcome::Delivered(action),
            Err(error) if error.is_retryable() => {
                self.queue(action, QueueReason::DeliveryFailed(error))
            }
            Err(error) => SubmitOutcome::Rejected { action, error },
        }
    }

    fn queue(&mut self, action: QueuedAction, reason: QueueReason) -> SubmitOutcome {
        SubmitOutcome::Queued {
            enqueued: self.store.append(action),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::offline::drainer::SkipReason;
    use crate::offline::store::QueueLimits;
    use crate::storage::MemoryStore;
    use serde_json::json;

    /// Records delivered payload texts; fails while `failing` is set.
    #[derive(Clone, Default)]
    struct Backend {
        delivered: Rc<RefCell<Vec<String>>>,
        failing: Rc<Cell<Option<DeliveryError>>>,
    }

    impl Backend {
        fn registry(&self) -> HandlerRegistry {
            let mut registry = HandlerRegistry::new();
            for kind in ActionKind::ALL {
                let backend = self.clone();
                registry.register(kind, move |a: &QueuedAction| -> Result<(), DeliveryError> {
                    if let Some(err) = backend.failing.take() {
                        backend.failing.set(Some(err.clone()));
                        return Err(err);
                    }
                    let label = a.payload_str("text").ok_or_else(|| {
                        DeliveryError::InvalidPayload("missing text".to_string())
                    })?;
                    backend.delivered.borrow_mut().push(label.to_string());
                    Ok(())
                });
            }
            registry
        }

        fn delivered(&self) -> Vec<String> {
            self.delivered.borrow().clone()
        }
    }

    fn session(backend: &Backend, online: &Rc<Cell<bool>>) -> OfflineSession {
        let store = QueueStore::load(Box::new(MemoryStore::new()), QueueLimits::default());
        let probe = {
            let online = Rc::clone(online);
            move || online.get()
        };
        OfflineSession::new(
            store,
            backend.registry(),
            Box::new(probe),
            DrainPolicy::StopOnFirstFailure,
        )
    }

    fn texts(session: &OfflineSession) -> Vec<String> {
        session
            .all()
            .iter()
            .filter_map(|a| a.payload_str("text").map(String::from))
            .collect()
    }

    #[test]
    fn test_offline_submissions_are_queued_then_replayed() {
        let backend = Backend::default();
        let online = Rc::new(Cell::new(false));
        let mut session = session(&backend, &online);

        for text in ["a", "b"] {
            let outcome = session.submit(ActionKind::ChatMessage, json!({ "text": text }), false);
            assert!(matches!(
                outcome,
                SubmitOutcome::Queued {
                    reason: QueueReason::Offline,
                    ..
                }
            ));
        }
        assert!(backend.delivered().is_empty());

        online.set(true);
        let refresh = session.refresh();

        assert_eq!(refresh.transition, Some(Transition::Online));
        assert_eq!(refresh.drain.unwrap().delivered_count(), 2);
        assert_eq!(backend.delivered(), vec!["a", "b"]);
        assert!(session.all().is_empty());
    }

    #[test]
    fn test_online_transition_with_empty_queue_does_not_drain() {
        let backend = Backend::default();
        let online = Rc::new(Cell::new(false));
        let mut session = session(&backend, &online);

        online.set(true);
        let refresh = session.refresh();

        assert_eq!(refresh.transition, Some(Transition::Online));
        assert_eq!(refresh.drain, None);
    }

    #[test]
    fn test_offline_transition_does_not_drain() {
        let backend = Backend::default();
        let online = Rc::new(Cell::new(true));
        let mut session = session(&backend, &online);
        session.enqueue(ActionKind::ChatMessage, json!({"text": "a"}));

        online.set(false);
        let refresh = session.refresh();

        assert_eq!(refresh.transition, Some(Transition::Offline));
        assert_eq!(refresh.drain, None);
        assert_eq!(texts(&session), vec!["a"]);
    }

    #[test]
    fn test_online_submit_delivers_directly() {
        let backend = Backend::default();
        let online = Rc::new(Cell::new(true));
        let mut session = session(&backend, &online);

        let outcome = session.submit(ActionKind::ChatMessage, json!({"text": "hi"}), false);

        assert!(matches!(outcome, SubmitOutcome::Delivered(_)));
        assert_eq!(backend.delivered(), vec!["hi"]);
        assert!(session.all().is_empty());
    }

    #[test]
    fn test_failed_submit_is_queued_with_same_id() {
        let backend = Backend::default();
        backend.failing.set(Some(DeliveryError::Timeout));
        let online = Rc::new(Cell::new(true));
        let mut session = session(&backend, &online);

        let SubmitOutcome::Queued { enqueued, reason } =
            session.submit(ActionKind::ChatMessage, json!({"text": "hi"}), false)
        else {
            panic!("expected the action to be queued");
        };

        assert_eq!(reason, QueueReason::DeliveryFailed(DeliveryError::Timeout));
        assert_eq!(session.all()[0].id, enqueued.action.id);
    }

    #[test]
    fn test_permanent_failure_is_not_queued() {
        let backend = Backend::default();
        let online = Rc::new(Cell::new(true));
        let mut session = session(&backend, &online);

        let outcome = session.submit(ActionKind::ChatMessage, json!({"no_text": true}), false);

        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected {
                error: DeliveryError::InvalidPayload(_),
                ..
            }
        ));
        assert!(session.all().is_empty());
    }

    #[test]
    fn test_online_submit_goes_behind_backlog() {
        let backend = Backend::default();
        let online = Rc::new(Cell::new(true));
        let mut session = session(&backend, &online);
        session.enqueue(ActionKind::ChatMessage, json!({"text": "older"}));

        let outcome = session.submit(ActionKind::ChatMessage, json!({"text": "newer"}), false);

        assert!(matches!(outcome, SubmitOutcome::Delivered(_)));
        assert_eq!(backend.delivered(), vec!["older", "newer"]);
    }

    #[test]
    fn test_blocked_backlog_keeps_new_submission_queued() {
        let backend = Backend::default();
        let online = Rc::new(Cell::new(true));
        let mut session = session(&backend, &online);
        session.enqueue(ActionKind::ChatMessage, json!({"text": "older"}));
        backend.failing.set(Some(DeliveryError::Unauthorized));

        let outcome = session.submit(ActionKind::ChatMessage, json!({"text": "newer"}), false);

        assert!(matches!(
            outcome,
            SubmitOutcome::Queued {
                reason: QueueReason::Backlog,
                ..
            }
        ));
        assert_eq!(texts(&session), vec!["older", "newer"]);
    }

    #[test]
    fn test_deferred_submit_skips_delivery() {
        let backend = Backend::default();
        let online = Rc::new(Cell::new(true));
        let mut session = session(&backend, &online);

        let outcome = session.submit(ActionKind::ChatMessage, json!({"text": "later"}), true);

        assert!(matches!(
            outcome,
            SubmitOutcome::Queued {
                reason: QueueReason::Deferred,
                ..
            }
        ));
        assert!(backend.delivered().is_empty());
    }

    #[test]
    fn test_trigger_drain_respects_reachability() {
        let backend = Backend::default();
        let online = Rc::new(Cell::new(false));
        let mut session = session(&backend, &online);
        session.enqueue(ActionKind::ChatMessage, json!({"text": "a"}));

        assert_eq!(session.trigger_drain(), DrainOutcome::Skipped(SkipReason::Offline));
        assert!(!session.is_online());
    }

    #[test]
    fn test_clear_discards_everything() {
        let backend = Backend::default();
        let online = Rc::new(Cell::new(false));
        let mut session = session(&backend, &online);
        for text in ["a", "b", "c"] {
            session.enqueue(ActionKind::ChatMessage, json!({ "text": text }));
        }

        session.clear();

        assert!(session.all().is_empty());
        assert_eq!(session.trigger_drain(), DrainOutcome::Skipped(SkipReason::Offline));
    }

    #[test]
    fn test_subscribers_see_refresh_transitions() {
        let backend = Backend::default();
        let online = Rc::new(Cell::new(false));
        let mut session = session(&backend, &online);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        session
            .monitor_mut()
            .subscribe(move |t| sink.borrow_mut().push(t));

        online.set(true);
        session.refresh();
        online.set(false);
        session.refresh();

        assert_eq!(*seen.borrow(), vec![Transition::Online, Transition::Offline]);
    }
}
