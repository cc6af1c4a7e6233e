//! Offline submission queue.
//!
//! Actions that cannot reach the backend are held in a [`QueueStore`] and
//! replayed in order by a [`QueueDrainer`] once the [`ConnectivityMonitor`]
//! sees the backend again.

mod action;
mod connectivity;
mod delivery;
mod drainer;
mod session;
mod store;

pub use action::{ActionKind, QueuedAction};
pub use connectivity::{
    ConnectivityMonitor, ConnectivitySource, FixedConnectivity, SubscriptionId, Transition,
};
pub use delivery::{DeliveryError, DeliveryHandler, HandlerRegistry};
pub use drainer::{
    format_drain_outcome, DeliveryFailure, DrainOutcome, DrainPolicy, DrainReport, QueueDrainer,
    SkipReason,
};
pub use session::{OfflineSession, QueueReason, Refresh, SubmitOutcome};
pub use store::{Durability, Enqueued, QueueLimits, QueueStore, CORRUPT_KEY, QUEUE_KEY};
