//! Command-line interface for crewsync.

pub mod args;
pub mod commands;
pub mod context;

pub use context::Context;
