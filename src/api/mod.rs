//! Training backend integration.
//!
//! The HTTP client, the per-kind delivery handlers the queue replays through,
//! the reachability probe and the stored auth token.

mod auth;
mod client;
mod probe;
#[cfg(test)]
pub(crate) mod testing;

use std::rc::Rc;

pub use auth::{TokenStore, AUTH_TOKEN_KEY, TOKEN_ENV};
pub use client::{route, ApiClient, Route};
pub use probe::HttpProbe;

use crate::offline::{ActionKind, HandlerRegistry, QueuedAction};

/// Handlers delivering every action kind through `client`.
#[must_use]
pub fn delivery_handlers(client: &Rc<ApiClient>) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    for kind in ActionKind::ALL {
        let client = Rc::clone(client);
        registry.register(kind, move |action: &QueuedAction| client.deliver(action));
    }
    registry
}
