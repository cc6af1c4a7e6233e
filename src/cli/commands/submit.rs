//! Submission command implementation.
//!
//! Builds the payload for each kind of crew action and hands it to the
//! offline session, which delivers or queues it.

use serde_json::{json, Map, Value};

use crate::cli::args::{OutputFormat, SubmitCommands};
use crate::cli::context::Context;
use crate::error::CrewsyncError;
use crate::offline::{ActionKind, SubmitOutcome};
use crate::output::format_submit;

/// Build the queued payload for a submit subcommand.
///
/// # Errors
///
/// Returns `CrewsyncError::Config` if `--answers` is not a JSON object.
pub fn build_payload(cmd: SubmitCommands) -> Result<(ActionKind, Value), CrewsyncError> {
    match cmd {
        SubmitCommands::Quiz {
            quiz_id,
            score,
            passed,
            answers,
        } => {
            let answers = match answers {
                Some(raw) => match serde_json::from_str::<Value>(&raw) {
                    Ok(Value::Object(map)) => Value::Object(map),
                    Ok(_) => {
                        return Err(CrewsyncError::Config(
                            "--answers must be a JSON object".to_string(),
                        ))
                    }
                    Err(e) => {
                        return Err(CrewsyncError::Config(format!("--answers is not valid JSON: {e}")))
                    }
                },
                None => Value::Object(Map::new()),
            };
            Ok((
                ActionKind::QuizResult,
                json!({
                    "quizId": quiz_id,
                    "answers": answers,
                    "score": score,
                    "passed": passed,
                }),
            ))
        }
        SubmitCommands::Procedure {
            procedure_id,
            steps,
        } => Ok((
            ActionKind::ProcedureCompletion,
            json!({
                "procedureId": procedure_id,
                "completedSteps": steps,
            }),
        )),
        SubmitCommands::Chat { text, language } => {
            if text.trim().is_empty() {
                return Err(CrewsyncError::Config("question text is empty".to_string()));
            }
            let mut payload = json!({ "text": text });
            if let Some(language) = language {
                payload["language"] = Value::String(language);
            }
            Ok((ActionKind::ChatMessage, payload))
        }
    }
}

/// Execute the submit command.
///
/// # Errors
///
/// Returns an error if the arguments are invalid or the backend permanently
/// rejects the submission.
pub fn submit(
    ctx: &Context,
    cmd: SubmitCommands,
    defer: bool,
    format: OutputFormat,
) -> Result<String, CrewsyncError> {
    let (kind, payload) = build_payload(cmd)?;
    let mut session = ctx.session();

    let outcome = session.submit(kind, payload, defer);
    let queued = session.all().len();

    if let SubmitOutcome::Rejected { error, .. } = outcome {
        return Err(CrewsyncError::Delivery(error));
    }

    format_submit(&outcome, queued, format)
}
