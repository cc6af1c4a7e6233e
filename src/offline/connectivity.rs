//! Reachability tracking.
//!
//! [`ConnectivityMonitor`] holds the last known reachability and tells
//! subscribers about every change. It does no filtering: a flapping link
//! produces one transition per flip.

use serde::Serialize;
use tracing::info;

/// Something that can report whether the backend is reachable right now.
pub trait ConnectivitySource {
    /// Current reachability.
    fn is_reachable(&self) -> bool;
}

/// A source pinned to one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedConnectivity(pub bool);

impl ConnectivitySource for FixedConnectivity {
    fn is_reachable(&self) -> bool {
        self.0
    }
}

impl<F: Fn() -> bool> ConnectivitySource for F {
    fn is_reachable(&self) -> bool {
        self()
    }
}

/// A change in reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Unreachable to reachable.
    Online,
    /// Reachable to unreachable.
    Offline,
}

/// Handle returned by [`ConnectivityMonitor::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(Transition)>;

/// Last known reachability plus transition subscribers.
pub struct ConnectivityMonitor {
    reachable: bool,
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl ConnectivityMonitor {
    /// Create a monitor seeded with the source's current answer.
    #[must_use]
    pub fn new(source: &dyn ConnectivitySource) -> Self {
        Self::with_state(source.is_reachable())
    }

    /// Create a monitor with a known initial state.
    #[must_use]
    pub const fn with_state(reachable: bool) -> Self {
        Self {
            reachable,
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    /// Last known reachability.
    #[must_use]
    pub const fn is_reachable(&self) -> bool {
        self.reachable
    }

    /// Register a callback invoked synchronously on every transition.
    pub fn subscribe(&mut self, callback: impl FnMut(Transition) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Record a reachability reading, notifying subscribers if it changed.
    pub fn set_reachable(&mut self, reachable: bool) -> Option<Transition> {
        if reachable == self.reachable {
            return None;
        }
        self.reachable = reachable;

        let transition = if reachable {
            Transition::Online
        } else {
            Transition::Offline
        };
        info!(?transition, "connectivity changed");

        for (_, callback) in &mut self.subscribers {
            callback(transition);
        }
        Some(transition)
    }

    /// Read the source and record the result.
    pub fn poll(&mut self, source: &dyn ConnectivitySource) -> Option<Transition> {
        self.set_reachable(source.is_reachable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn test_initial_state_from_source() {
        assert!(ConnectivityMonitor::new(&FixedConnectivity(true)).is_reachable());
        assert!(!ConnectivityMonitor::new(&FixedConnectivity(false)).is_reachable());
    }

    #[test]
    fn test_transitions_are_reported_once_per_change() {
        let mut monitor = ConnectivityMonitor::with_state(false);

        assert_eq!(monitor.set_reachable(false), None);
        assert_eq!(monitor.set_reachable(true), Some(Transition::Online));
        assert_eq!(monitor.set_reachable(true), None);
        assert_eq!(monitor.set_reachable(false), Some(Transition::Offline));
        assert!(!monitor.is_reachable());
    }

    #[test]
    fn test_subscribers_see_every_flip() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut monitor = ConnectivityMonitor::with_state(false);

        let sink = Rc::clone(&seen);
        monitor.subscribe(move |t| sink.borrow_mut().push(t));

        for reachable in [true, false, true, true, false] {
            monitor.set_reachable(reachable);
        }

        assert_eq!(
            *seen.borrow(),
            vec![
                Transition::Online,
                Transition::Offline,
                Transition::Online,
                Transition::Offline
            ]
        );
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let count = Rc::new(Cell::new(0));
        let mut monitor = ConnectivityMonitor::with_state(true);

        let counter = Rc::clone(&count);
        let id = monitor.subscribe(move |_| counter.set(counter.get() + 1));

        monitor.set_reachable(false);
        assert!(monitor.unsubscribe(id));
        assert!(!monitor.unsubscribe(id));
        monitor.set_reachable(true);

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_poll_reads_source() {
        let up = Rc::new(Cell::new(false));
        let probe = {
            let up = Rc::clone(&up);
            move || up.get()
        };
        let mut monitor = ConnectivityMonitor::new(&probe);

        assert_eq!(monitor.poll(&probe), None);
        up.set(true);
        assert_eq!(monitor.poll(&probe), Some(Transition::Online));
    }
}
