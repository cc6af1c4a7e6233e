//! Queue inspection command implementation.

use serde_json::json;

use crate::cli::args::{OutputFormat, QueueCommands};
use crate::cli::context::Context;
use crate::error::CrewsyncError;
use crate::output::{format_actions, format_summary, to_json, QueueSummary};

/// Execute queue subcommands.
///
/// # Errors
///
/// Returns an error if clearing is requested without `--force` or output
/// formatting fails.
pub fn queue(ctx: &Context, cmd: QueueCommands, format: OutputFormat) -> Result<String, CrewsyncError> {
    match cmd {
        QueueCommands::List { limit } => {
            let store = ctx.store();
            format_actions(store.all(), limit, format)
        }
        QueueCommands::Status => {
            let session = ctx.session();
            let summary = QueueSummary::new(session.store(), session.is_online());
            format_summary(&summary, format)
        }
        QueueCommands::Clear { force } => clear(ctx, force, format),
    }
}

fn clear(ctx: &Context, force: bool, format: OutputFormat) -> Result<String, CrewsyncError> {
    if !force {
        return Err(CrewsyncError::Config(
            "Use --force to discard queued submissions".to_string(),
        ));
    }

    let mut store = ctx.store();
    let count = store.len();
    store.clear();

    match format {
        OutputFormat::Json => to_json(&json!({ "cleared": count })),
        OutputFormat::Pretty => Ok(format!("Discarded {count} queued submissions")),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::config::Config;
    use crate::offline::ActionKind;
    use crate::storage::MemoryStore;

    fn context() -> Context {
        Context::with_storage(Rc::new(MemoryStore::new()), Config::default(), true)
    }

    #[test]
    fn test_clear_requires_force() {
        let ctx = context();
        ctx.store().enqueue(ActionKind::ChatMessage, json!({"text": "hi"}));

        assert!(matches!(
            queue(&ctx, QueueCommands::Clear { force: false }, OutputFormat::Pretty),
            Err(CrewsyncError::Config(_))
        ));
        assert_eq!(ctx.store().len(), 1);

        let out = queue(&ctx, QueueCommands::Clear { force: true }, OutputFormat::Json).unwrap();
        assert!(out.contains("\"cleared\": 1"));
        assert!(ctx.store().is_empty());
    }

    #[test]
    fn test_status_offline() {
        let ctx = context();
        ctx.store().enqueue(ActionKind::QuizResult, json!({"quizId": "1"}));

        let out = queue(&ctx, QueueCommands::Status, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["queued"], 1);
        assert_eq!(value["online"], false);
        assert_eq!(value["durability"], "memory_only");
    }

    #[test]
    fn test_list_reads_shared_storage() {
        let ctx = context();
        ctx.store().enqueue(ActionKind::ChatMessage, json!({"text": "first"}));
        ctx.store().enqueue(ActionKind::ChatMessage, json!({"text": "second"}));

        let out = queue(&ctx, QueueCommands::List { limit: None }, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["items"][0]["data"]["text"], "first");
        assert_eq!(value["items"][1]["data"]["text"], "second");
    }
}
