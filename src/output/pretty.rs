use chrono::{DateTime, Utc};
use colored::Colorize;

use super::QueueSummary;
use crate::offline::{
    ActionKind, Durability, QueueReason, QueuedAction, SubmitOutcome, Transition,
};

const SUMMARY_WIDTH: usize = 50;

/// Human-friendly age such as "3 hours ago".
#[must_use]
pub fn format_age(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(since);
    if age.num_days() > 0 {
        format!("{} days ago", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{} hours ago", age.num_hours())
    } else if age.num_minutes() > 0 {
        format!("{} minutes ago", age.num_minutes())
    } else {
        "just now".to_string()
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

/// One-line description of what an action carries.
#[must_use]
pub fn describe_action(action: &QueuedAction) -> String {
    let data = &action.payload;
    match action.kind {
        ActionKind::QuizResult => {
            let mut text = format!("quiz {}", action.payload_str("quizId").unwrap_or("?"));
            if let Some(score) = data.get("score").and_then(serde_json::Value::as_f64) {
                text.push_str(&format!(", {score}%"));
            }
            match data.get("passed").and_then(serde_json::Value::as_bool) {
                Some(true) => text.push_str(", passed"),
                Some(false) => text.push_str(", not passed"),
                None => {}
            }
            text
        }
        ActionKind::ProcedureCompletion => {
            let steps = data
                .get("completedSteps")
                .and_then(serde_json::Value::as_array)
                .map_or(0, Vec::len);
            format!(
                "procedure {}, {steps} steps",
                action.payload_str("procedureId").unwrap_or("?")
            )
        }
        ActionKind::ChatMessage => {
            format!("\"{}\"", truncate(action.payload_str("text").unwrap_or(""), SUMMARY_WIDTH))
        }
    }
}

/// Format queued actions as a table, oldest first
#[must_use]
pub fn format_actions_pretty(actions: &[QueuedAction], limit: Option<usize>) -> String {
    if actions.is_empty() {
        return "Queued submissions (0)\n  Nothing waiting".to_string();
    }

    let now = Utc::now();
    let shown = limit.unwrap_or(actions.len());

    let mut lines = Vec::new();
    lines.push(format!("Queued submissions ({})", actions.len()));
    lines.push("─".repeat(70));
    lines.push(format!("{:<10} {:<22} {:<16} {}", "ID", "Type", "Queued", "Details"));
    lines.push("─".repeat(70));

    for action in actions.iter().take(shown) {
        let short_id: String = action.id.chars().take(8).collect();
        lines.push(format!(
            "{:<10} {:<22} {:<16} {}",
            short_id.dimmed(),
            action.kind.display_name(),
            format_age(action.enqueued_at, now),
            describe_action(action)
        ));
    }

    if actions.len() > shown {
        lines.push(
            format!("  ... and {} more", actions.len() - shown)
                .dimmed()
                .to_string(),
        );
    }

    lines.join("\n")
}

fn connectivity_badge(online: bool) -> String {
    if online {
        format!("{} online", "●".green())
    } else {
        format!("{} offline", "●".red())
    }
}

/// Format the queue status panel
#[must_use]
pub fn format_summary_pretty(summary: &QueueSummary) -> String {
    let mut lines = Vec::new();

    lines.push("Offline Queue Status".bold().to_string());
    lines.push("─".repeat(40));
    lines.push(format!("  Backend:    {}", connectivity_badge(summary.online)));
    lines.push(format!(
        "  Queued:     {} {}",
        summary.queued,
        if summary.queued > 0 {
            "submissions waiting".dimmed()
        } else {
            "".dimmed()
        }
    ));

    for (kind, count) in &summary.by_kind {
        let name = kind
            .parse::<ActionKind>()
            .map_or_else(|_| (*kind).to_string(), |k| k.display_name().to_string());
        lines.push(format!("    {name}: {count}"));
    }

    if let Some(oldest) = summary.oldest {
        lines.push(format!(
            "  Oldest:     {}",
            format_age(oldest, Utc::now()).dimmed()
        ));
    }

    if summary.durability == Durability::MemoryOnly {
        lines.push(format!(
            "  {} queue is not saved to disk",
            "!".yellow().bold()
        ));
    }

    if summary.queued > 0 {
        lines.push(String::new());
        let hint = if summary.online {
            "Run 'crewsync sync' to send queued submissions"
        } else {
            "Queued submissions will be sent when the backend is reachable"
        };
        lines.push(hint.dimmed().to_string());
    }

    lines.join("\n")
}

/// Format the result of a submission
#[must_use]
pub fn format_submit_pretty(outcome: &SubmitOutcome, queued: usize) -> String {
    match outcome {
        SubmitOutcome::Delivered(action) => format!(
            "{} {} sent ({})",
            "✓".green(),
            action.kind.display_name(),
            describe_action(action)
        ),
        SubmitOutcome::Queued { enqueued, reason } => {
            let why = match reason {
                QueueReason::Offline => "backend unreachable".to_string(),
                QueueReason::Deferred => "deferred".to_string(),
                QueueReason::Backlog => "waiting behind older submissions".to_string(),
                QueueReason::DeliveryFailed(e) => e.to_string(),
            };
            let mut text = format!(
                "{} {} queued: {} ({} waiting)",
                "○".yellow(),
                enqueued.action.kind.display_name(),
                why,
                queued
            );
            if enqueued.durability == Durability::MemoryOnly {
                text.push_str(&format!(
                    "\n  {} not saved to disk, it will be lost when this process exits",
                    "!".yellow().bold()
                ));
            }
            text
        }
        SubmitOutcome::Rejected { action, error } => format!(
            "{} {} rejected: {}",
            "✗".red(),
            action.kind.display_name(),
            error
        ),
    }
}

/// Format a connectivity change
#[must_use]
pub fn format_transition_pretty(transition: Transition, queued: usize) -> String {
    let now = Utc::now().format("%H:%M:%S");
    match transition {
        Transition::Online => format!(
            "[{now}] {} backend reachable ({queued} queued)",
            "●".green()
        ),
        Transition::Offline => format!(
            "[{now}] {} backend unreachable, queueing submissions",
            "●".red()
        ),
    }
}
