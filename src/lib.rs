//! crewsync - offline submission queue for F&B crew training
//!
//! Quiz results, procedure completions and assistant questions are delivered
//! to the training backend when it is reachable and held in a durable, ordered
//! queue when it is not. The queue is replayed oldest first once the backend
//! comes back.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod offline;
pub mod output;
pub mod storage;

pub use cli::args::{Cli, Commands, OutputFormat};
pub use error::CrewsyncError;
pub use offline::{OfflineSession, QueueDrainer, QueueStore};
