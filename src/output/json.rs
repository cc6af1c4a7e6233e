//! JSON output formatting for crewsync.
//!
//! Queued actions are emitted in their stored layout (`id`, `type`, `data`,
//! `timestamp`) so scripts can read them the same way the browser client does.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::CrewsyncError;
use crate::offline::{DrainOutcome, QueueReason, QueuedAction, SubmitOutcome};

/// Format queued actions as JSON
///
/// # Errors
///
/// Returns `CrewsyncError::Parse` if JSON serialization fails.
pub fn format_actions_json(
    actions: &[QueuedAction],
    limit: Option<usize>,
) -> Result<String, CrewsyncError> {
    let shown = &actions[..limit.unwrap_or(actions.len()).min(actions.len())];
    let output = json!({
        "count": actions.len(),
        "items": shown
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format a submission result as JSON
///
/// # Errors
///
/// Returns `CrewsyncError::Parse` if JSON serialization fails.
pub fn format_submit_json(outcome: &SubmitOutcome, queued: usize) -> Result<String, CrewsyncError> {
    let output = match outcome {
        SubmitOutcome::Delivered(action) => json!({
            "status": "delivered",
            "id": action.id,
            "type": action.kind,
            "queued": queued,
        }),
        SubmitOutcome::Queued { enqueued, reason } => {
            let (reason, error) = match reason {
                QueueReason::Offline => ("offline", None),
                QueueReason::Deferred => ("deferred", None),
                QueueReason::Backlog => ("backlog", None),
                QueueReason::DeliveryFailed(e) => ("delivery_failed", Some(e.to_string())),
            };
            json!({
                "status": "queued",
                "id": enqueued.action.id,
                "type": enqueued.action.kind,
                "reason": reason,
                "error": error,
                "durability": enqueued.durability,
                "queued": queued,
            })
        }
        SubmitOutcome::Rejected { action, error } => json!({
            "status": "rejected",
            "id": action.id,
            "type": action.kind,
            "error": error.to_string(),
            "queued": queued,
        }),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

/// JSON value describing a drain outcome
#[must_use]
pub fn drain_value(outcome: &DrainOutcome) -> Value {
    match outcome {
        DrainOutcome::Skipped(reason) => json!({
            "status": "skipped",
            "reason": reason,
        }),
        DrainOutcome::Completed(report) => {
            let failures: Vec<_> = report
                .failures
                .iter()
                .map(|f| {
                    json!({
                        "id": f.id,
                        "type": f.kind,
                        "error": f.error.to_string(),
                        "retryable": f.error.is_retryable(),
                    })
                })
                .collect();
            json!({
                "status": "completed",
                "attempted": report.attempted,
                "delivered": report.delivered,
                "failures": failures,
                "remaining": report.remaining,
                "halted": report.halted,
            })
        }
    }
}

/// Format a drain outcome as JSON
///
/// # Errors
///
/// Returns `CrewsyncError::Parse` if JSON serialization fails.
pub fn format_drain_json(outcome: &DrainOutcome) -> Result<String, CrewsyncError> {
    Ok(serde_json::to_string_pretty(&drain_value(outcome))?)
}

/// Generic JSON formatter for any serializable type
///
/// # Errors
///
/// Returns `CrewsyncError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, CrewsyncError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Single-line JSON, for streams of events
///
/// # Errors
///
/// Returns `CrewsyncError::Parse` if JSON serialization fails.
pub fn to_json_line<T: Serialize>(value: &T) -> Result<String, CrewsyncError> {
    Ok(serde_json::to_string(value)?)
}
