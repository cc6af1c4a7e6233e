//! Output formatting for crewsync.
//!
//! This module renders queue contents, submissions and sync results either as
//! colored terminal text or as JSON.

mod json;
mod pretty;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::error::CrewsyncError;
use crate::offline::{DrainOutcome, Durability, QueueStore, QueuedAction, SubmitOutcome};

pub use json::*;
pub use pretty::*;

/// Snapshot of the queue for `queue status`.
#[derive(Debug, Clone, Serialize)]
pub struct QueueSummary {
    /// Number of queued actions
    pub queued: usize,
    /// Last known reachability
    pub online: bool,
    /// Whether the queue is on disk
    pub durability: Durability,
    /// When the oldest action was queued
    pub oldest: Option<DateTime<Utc>>,
    /// Queued actions per kind
    pub by_kind: BTreeMap<&'static str, usize>,
}

impl QueueSummary {
    /// Summarise `store` with the given reachability.
    #[must_use]
    pub fn new(store: &QueueStore, online: bool) -> Self {
        let mut by_kind = BTreeMap::new();
        for action in store.all() {
            *by_kind.entry(action.kind.as_str()).or_insert(0) += 1;
        }

        Self {
            queued: store.len(),
            online,
            durability: store.durability(),
            oldest: store.oldest().map(|a| a.enqueued_at),
            by_kind,
        }
    }
}

/// Format queued actions based on output format
///
/// # Errors
///
/// Returns `CrewsyncError::Parse` if JSON serialization fails.
pub fn format_actions(
    actions: &[QueuedAction],
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<String, CrewsyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_actions_pretty(actions, limit)),
        OutputFormat::Json => format_actions_json(actions, limit),
    }
}

/// Format a queue summary based on output format
///
/// # Errors
///
/// Returns `CrewsyncError::Parse` if JSON serialization fails.
pub fn format_summary(summary: &QueueSummary, format: OutputFormat) -> Result<String, CrewsyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_summary_pretty(summary)),
        OutputFormat::Json => to_json(summary),
    }
}

/// Format a submission result based on output format
///
/// # Errors
///
/// Returns `CrewsyncError::Parse` if JSON serialization fails.
pub fn format_submit(
    outcome: &SubmitOutcome,
    queued: usize,
    format: OutputFormat,
) -> Result<String, CrewsyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_submit_pretty(outcome, queued)),
        OutputFormat::Json => format_submit_json(outcome, queued),
    }
}

/// Format a drain outcome based on output format
///
/// # Errors
///
/// Returns `CrewsyncError::Parse` if JSON serialization fails.
pub fn format_drain(outcome: &DrainOutcome, format: OutputFormat) -> Result<String, CrewsyncError> {
    match format {
        OutputFormat::Pretty => Ok(crate::offline::format_drain_outcome(outcome)),
        OutputFormat::Json => format_drain_json(outcome),
    }
}
