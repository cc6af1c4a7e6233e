//! Queued action types.
//!
//! Defines the kinds of crew actions that can be deferred and the record
//! stored for each one.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Kinds of actions that can be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// A finished quiz attempt
    QuizResult,
    /// A finished step-by-step procedure
    ProcedureCompletion,
    /// A question for the training assistant
    ChatMessage,
}

impl ActionKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 3] = [Self::QuizResult, Self::ProcedureCompletion, Self::ChatMessage];

    /// Get the display name for this kind.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::QuizResult => "Quiz Result",
            Self::ProcedureCompletion => "Procedure Completion",
            Self::ChatMessage => "Chat Message",
        }
    }

    /// Stored name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::QuizResult => "quiz_result",
            Self::ProcedureCompletion => "procedure_completion",
            Self::ChatMessage => "chat_message",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "quiz_result" | "quiz" => Ok(Self::QuizResult),
            "procedure_completion" | "procedure" => Ok(Self::ProcedureCompletion),
            "chat_message" | "chat" => Ok(Self::ChatMessage),
            _ => Err(format!("unknown action kind: {s}")),
        }
    }
}

/// An action waiting for delivery.
///
/// Field names on disk follow the browser client's `queuedSubmissions`
/// records, so queues written by either side stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    /// Unique ID, also sent as the idempotency key
    pub id: String,
    /// What kind of action this is
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Kind-specific JSON payload
    #[serde(rename = "data")]
    pub payload: Value,
    /// When the action was queued
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedAction {
    /// Create a new action with a fresh ID and the current time.
    #[must_use]
    pub fn new(kind: ActionKind, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            payload,
            // Stored with millisecond precision
            enqueued_at: Utc::now().trunc_subsecs(3),
        }
    }

    /// Key the remote endpoint can deduplicate retried deliveries on.
    #[must_use]
    pub fn idempotency_key(&self) -> &str {
        &self.id
    }

    /// Read a string field from the payload.
    #[must_use]
    pub fn payload_str(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(Value::as_str)
    }
}
