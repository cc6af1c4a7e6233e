//! Delivery handlers.
//!
//! A handler sends one queued action to its remote destination. The queue
//! only sees success or a [`DeliveryError`]; how the request is built is the
//! handler's business.

use std::collections::HashMap;

use thiserror::Error;

use super::action::{ActionKind, QueuedAction};

/// Why a delivery did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The request did not complete within the transport timeout.
    #[error("request timed out")]
    Timeout,

    /// The request could not be sent or the response could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend rejected our credentials.
    #[error("not authorized, log in again")]
    Unauthorized,

    /// The backend answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The payload lacks what the endpoint needs.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Nothing is registered for this kind.
    #[error("no delivery handler for {0}")]
    NoHandler(ActionKind),
}

impl DeliveryError {
    /// Whether trying the same action later could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Transport(_) | Self::Unauthorized => true,
            Self::Rejected { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            Self::InvalidPayload(_) | Self::NoHandler(_) => false,
        }
    }
}

/// Sends one action to its remote destination.
#[cfg_attr(test, mockall::automock)]
pub trait DeliveryHandler {
    /// Deliver `action`, returning once the outcome is known.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] if the action was not accepted.
    fn deliver(&self, action: &QueuedAction) -> Result<(), DeliveryError>;
}

impl<F> DeliveryHandler for F
where
    F: Fn(&QueuedAction) -> Result<(), DeliveryError>,
{
    fn deliver(&self, action: &QueuedAction) -> Result<(), DeliveryError> {
        self(action)
    }
}

/// Handlers keyed by action kind.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<ActionKind, Box<dyn DeliveryHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: ActionKind, handler: impl DeliveryHandler + 'static) {
        self.handlers.insert(kind, Box::new(handler));
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, kind: ActionKind, handler: impl DeliveryHandler + 'static) -> Self {
        self.register(kind, handler);
        self
    }

    /// Whether a handler exists for `kind`.
    #[must_use]
    pub fn handles(&self, kind: ActionKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Dispatch `action` to the handler for its kind.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::NoHandler`] if no handler is registered, or
    /// whatever the handler reports.
    pub fn deliver(&self, action: &QueuedAction) -> Result<(), DeliveryError> {
        self.handlers
            .get(&action.kind)
            .ok_or(DeliveryError::NoHandler(action.kind))?
            .deliver(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dispatches_by_kind() {
        let mut quiz = MockDeliveryHandler::new();
        quiz.expect_deliver().times(1).returning(|_| Ok(()));

        let mut chat = MockDeliveryHandler::new();
        chat.expect_deliver()
            .times(1)
            .returning(|_| Err(DeliveryError::Timeout));

        let registry = HandlerRegistry::new()
            .with(ActionKind::QuizResult, quiz)
            .with(ActionKind::ChatMessage, chat);

        let quiz_action = QueuedAction::new(ActionKind::QuizResult, json!({}));
        let chat_action = QueuedAction::new(ActionKind::ChatMessage, json!({}));

        assert_eq!(registry.deliver(&quiz_action), Ok(()));
        assert_eq!(registry.deliver(&chat_action), Err(DeliveryError::Timeout));
    }

    #[test]
    fn test_missing_handler_is_a_failure() {
        let registry = HandlerRegistry::new();
        let action = QueuedAction::new(ActionKind::ProcedureCompletion, json!({}));

        assert!(!registry.handles(ActionKind::ProcedureCompletion));
        assert_eq!(
            registry.deliver(&action),
            Err(DeliveryError::NoHandler(ActionKind::ProcedureCompletion))
        );
    }

    #[test]
    fn test_closures_are_handlers() {
        let registry = HandlerRegistry::new().with(ActionKind::ChatMessage, |a: &QueuedAction| {
            if a.payload_str("text").is_some() {
                Ok(())
            } else {
                Err(DeliveryError::InvalidPayload("missing text".to_string()))
            }
        });

        let good = QueuedAction::new(ActionKind::ChatMessage, json!({"text": "hi"}));
        let bad = QueuedAction::new(ActionKind::ChatMessage, json!({}));

        assert!(registry.deliver(&good).is_ok());
        assert!(matches!(registry.deliver(&bad), Err(DeliveryError::InvalidPayload(_))));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(DeliveryError::Timeout.is_retryable());
        assert!(DeliveryError::Unauthorized.is_retryable());
        assert!(DeliveryError::Rejected { status: 503, message: String::new() }.is_retryable());
        assert!(DeliveryError::Rejected { status: 429, message: String::new() }.is_retryable());
        assert!(!DeliveryError::Rejected { status: 422, message: String::new() }.is_retryable());
        assert!(!DeliveryError::InvalidPayload("x".to_string()).is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let err = DeliveryError::Rejected {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "server returned 500: boom");
        assert_eq!(
            DeliveryError::NoHandler(ActionKind::QuizResult).to_string(),
            "no delivery handler for Quiz Result"
        );
    }
}
