//! Queue drainer for replaying deferred actions.
//!
//! A pass walks a snapshot of the queue oldest first, dispatching each action
//! to its handler and removing only the ones that were delivered. Under the
//! default policy the pass stops at the first failure, so what remains is
//! always the untouched suffix starting at that action.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::action::ActionKind;
use super::delivery::{DeliveryError, HandlerRegistry};
use super::store::QueueStore;

/// What a pass does after a failed delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainPolicy {
    /// Stop the pass; later actions wait for the next trigger.
    #[default]
    StopOnFirstFailure,
    /// Keep going; later independent actions may be delivered before the failed one.
    ContinuePastFailures,
}

/// Why a pass did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The backend is not reachable.
    Offline,
    /// Nothing is queued.
    Empty,
    /// Another pass is in progress.
    AlreadyRunning,
}

/// A delivery that failed during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    /// Action ID
    pub id: String,
    /// Action kind
    pub kind: ActionKind,
    /// What went wrong
    pub error: DeliveryError,
}

/// Result of a pass that ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Number of deliveries attempted
    pub attempted: usize,
    /// IDs delivered and removed, in delivery order
    pub delivered: Vec<String>,
    /// Failed deliveries, in attempt order
    pub failures: Vec<DeliveryFailure>,
    /// Actions still queued after the pass
    pub remaining: usize,
    /// Whether the pass stopped early at a failure
    pub halted: bool,
}

impl DrainReport {
    /// Number of actions delivered.
    #[must_use]
    pub fn delivered_count(&self) -> usize {
        self.delivered.len()
    }

    /// Whether every attempted delivery succeeded.
    #[must_use]
    pub fn all_delivered(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of [`QueueDrainer::drain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Nothing was attempted.
    Skipped(SkipReason),
    /// The pass ran.
    Completed(DrainReport),
}

impl DrainOutcome {
    /// Number of actions delivered (zero when skipped).
    #[must_use]
    pub fn delivered_count(&self) -> usize {
        self.report().map_or(0, DrainReport::delivered_count)
    }

    /// The report, if the pass ran.
    #[must_use]
    pub const fn report(&self) -> Option<&DrainReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Skipped(_) => None,
        }
    }
}

/// Delivers queued actions, one pass at a time.
#[derive(Debug, Default)]
pub struct QueueDrainer {
    policy: DrainPolicy,
    running: AtomicBool,
}

/// Clears the in-progress flag when dropped.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl QueueDrainer {
    /// Create a drainer with the given policy.
    #[must_use]
    pub const fn new(policy: DrainPolicy) -> Self {
        Self {
            policy,
            running: AtomicBool::new(false),
        }
    }

    /// Whether a pass is in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn begin(&self) -> Option<DrainGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| DrainGuard(&self.running))
    }

    /// Run one pass over `store`.
    ///
    /// Does nothing when `reachable` is false, the queue is empty, or another
    /// pass holds the drainer.
    pub fn drain(
        &self,
        store: &mut QueueStore,
        handlers: &HandlerRegistry,
        reachable: bool,
    ) -> DrainOutcome {
        if !reachable {
            return DrainOutcome::Skipped(SkipReason::Offline);
        }
        if store.is_empty() {
            return DrainOutcome::Skipped(SkipReason::Empty);
        }
        let Some(_guard) = self.begin() else {
            debug!("drain already in progress, ignoring trigger");
            return DrainOutcome::Skipped(SkipReason::AlreadyRunning);
        };

        let snapshot = store.all().to_vec();
        let mut report = DrainReport::default();

        for action in &snapshot {
            report.attempted += 1;

            match handlers.deliver(action) {
                Ok(()) => {
                    debug!(id = %action.id, kind = action.kind.as_str(), "delivered queued action");
                    report.delivered.push(action.id.clone());
                }
                Err(error) => {
                    warn!(id = %action.id, kind = action.kind.as_str(), %error, "delivery failed");
                    report.failures.push(DeliveryFailure {
                        id: action.id.clone(),
                        kind: action.kind,
                        error,
                    });

                    if self.policy == DrainPolicy::StopOnFirstFailure {
                        report.halted = true;
                        break;
                    }
                }
            }
        }

        let delivered: HashSet<String> = report.delivered.iter().cloned().collect();
        store.remove(&delivered);
        report.remaining = store.len();

        info!(
            delivered = report.delivered_count(),
            failed = report.failures.len(),
            remaining = report.remaining,
            "drain pass finished"
        );

        DrainOutcome::Completed(report)
    }
}

/// Format a drain outcome for display.
#[must_use]
pub fn format_drain_outcome(outcome: &DrainOutcome) -> String {
    let report = match outcome {
        DrainOutcome::Skipped(SkipReason::Offline) => {
            return format!("{} backend unreachable, nothing sent", "○".yellow());
        }
        DrainOutcome::Skipped(SkipReason::Empty) => {
            return "No queued actions to sync.".to_string();
        }
        DrainOutcome::Skipped(SkipReason::AlreadyRunning) => {
            return "A sync is already in progress.".to_string();
        }
        DrainOutcome::Completed(report) => report,
    };

    let mut lines = Vec::new();

    lines.push(format!("Sync completed: {} attempted", report.attempted));
    lines.push("─".repeat(40));

    if report.delivered_count() > 0 {
        lines.push(format!(
            "  {} {}",
            "✓".green(),
            format!("{} delivered", report.delivered_count()).green()
        ));
    }

    if !report.failures.is_empty() {
        lines.push(format!(
            "  {} {}",
            "✗".red(),
            format!("{} failed", report.failures.len()).red()
        ));
    }

    if report.remaining > 0 {
        lines.push(format!(
            "  {} {}",
            "○".yellow(),
            format!("{} still queued", report.remaining).yellow()
        ));
    }

    if !report.failures.is_empty() {
        lines.push(String::new());
        lines.push("Errors:".to_string());
        for failure in report.failures.iter().take(3) {
            lines.push(format!("  - {}: {}", failure.kind, failure.error));
        }
    }

    lines.join("\n")
}
