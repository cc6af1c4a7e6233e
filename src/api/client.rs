//! Training backend client.
//!
//! Blocking JSON over HTTP. Every queued delivery carries the action ID as an
//! `Idempotency-Key` so the backend can recognise a retried submission.

use std::io;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, warn};
use ureq::{Agent, AgentBuilder};

use super::auth::TokenStore;
use crate::config::{ApiConfig, PROCEDURE_ID_PLACEHOLDER};
use crate::error::CrewsyncError;
use crate::offline::{ActionKind, DeliveryError, QueuedAction};

/// Endpoint path and body for one queued action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Path relative to the base URL
    pub path: String,
    /// JSON body
    pub body: Value,
}

/// Client for the training backend.
pub struct ApiClient {
    agent: Agent,
    base_url: String,
    language: String,
    procedure_path: String,
    tokens: TokenStore,
}

impl ApiClient {
    /// Client for `base_url` with the given per-request timeout.
    #[must_use]
    pub fn new(base_url: &str, language: &str, timeout: Duration, tokens: TokenStore) -> Self {
        Self {
            agent: AgentBuilder::new().timeout(timeout).build(),
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
            procedure_path: ApiConfig::default().procedure_path,
            tokens,
        }
    }

    /// Use `path` for procedure completions; `{id}` is replaced with the
    /// procedure ID.
    #[must_use]
    pub fn with_procedure_path(mut self, path: &str) -> Self {
        self.procedure_path = path.to_string();
        self
    }

    /// Client configured from the `api` config section.
    #[must_use]
    pub fn from_config(config: &ApiConfig, tokens: TokenStore) -> Self {
        Self::new(&config.base_url, &config.language, config.timeout(), tokens)
            .with_procedure_path(&config.procedure_path)
    }

    /// Base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The token store used for `Authorization`.
    #[must_use]
    pub const fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST `body` to `path` and return the decoded response body.
    ///
    /// A `token` field in a successful response replaces the stored token. A
    /// 401 discards it.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] describing why the request did not succeed.
    pub fn post_json(
        &self,
        path: &str,
        body: &Value,
        idempotency_key: Option<&str>,
    ) -> Result<Value, DeliveryError> {
        let url = self.url(path);
        let mut request = self.agent.post(&url);

        if let Some(token) = self.tokens.token() {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        if let Some(key) = idempotency_key {
            request = request.set("Idempotency-Key", key);
        }

        debug!(%url, "POST");
        match request.send_json(body) {
            Ok(response) => {
                let text = response.into_string().map_err(|e| read_error(&e))?;
                let value = parse_body(&text);

                if let Some(token) = value.get("token").and_then(Value::as_str) {
                    if !self.tokens.is_overridden() {
                        if let Err(e) = self.tokens.save(token) {
                            warn!(error = %e, "could not store refreshed token");
                        }
                    }
                }
                Ok(value)
            }
            Err(ureq::Error::Status(401, _)) => {
                self.tokens.discard();
                Err(DeliveryError::Unauthorized)
            }
            Err(ureq::Error::Status(status, response)) => {
                let text = response.into_string().unwrap_or_default();
                Err(DeliveryError::Rejected {
                    status,
                    message: error_message(&text),
                })
            }
            Err(ureq::Error::Transport(transport)) => Err(transport_error(&transport)),
        }
    }

    /// Deliver a queued action to its endpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] if the payload cannot be routed or the
    /// backend does not accept it.
    pub fn deliver(&self, action: &QueuedAction) -> Result<(), DeliveryError> {
        let route = route(action, &self.language, &self.procedure_path)?;
        self.post_json(&route.path, &route.body, Some(action.idempotency_key()))?;
        Ok(())
    }

    /// Exchange credentials for a token and store it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the credentials or returns no
    /// token.
    pub fn login(&self, email: &str, password: &str) -> Result<String, CrewsyncError> {
        let response = self
            .post_json(
                "/api/users/login",
                &json!({ "email": email, "password": password }),
                None,
            )
            .map_err(|e| match e {
                DeliveryError::Unauthorized => {
                    CrewsyncError::Auth("invalid email or password".to_string())
                }
                other => CrewsyncError::Delivery(other),
            })?;

        let token = response
            .get("token")
            .and_then(Value::as_str)
            .ok_or_else(|| CrewsyncError::Auth("login response carried no token".to_string()))?;

        self.tokens.save(token)?;
        Ok(token.to_string())
    }
}

/// Map an action to its endpoint. Procedure completions go to
/// `procedure_path` with `{id}` filled in.
///
/// # Errors
///
/// Returns [`DeliveryError::InvalidPayload`] if the routing field is missing.
pub fn route(
    action: &QueuedAction,
    language: &str,
    procedure_path: &str,
) -> Result<Route, DeliveryError> {
    let required = |field: &str| {
        action
            .payload_str(field)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| DeliveryError::InvalidPayload(format!("missing {field}")))
    };

    match action.kind {
        ActionKind::QuizResult => Ok(Route {
            path: format!("/api/quizzes/{}/complete", required("quizId")?),
            body: action.payload.clone(),
        }),
        ActionKind::ProcedureCompletion => Ok(Route {
            path: procedure_path.replace(PROCEDURE_ID_PLACEHOLDER, required("procedureId")?),
            body: action.payload.clone(),
        }),
        ActionKind::ChatMessage => {
            let text = required("text")?;
            let language = action.payload_str("language").unwrap_or(language);
            Ok(Route {
                path: "/api/documents/query".to_string(),
                body: json!({
                    "query": text,
                    "procedure_mode": true,
                    "include_audio": false,
                    "language": language,
                }),
            })
        }
    }
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Prefer the backend's `detail` field over the raw body.
fn error_message(text: &str) -> String {
    match parse_body(text) {
        Value::Object(map) => map
            .get("detail")
            .and_then(Value::as_str)
            .map_or_else(|| text.trim().to_string(), String::from),
        Value::Null => "no response body".to_string(),
        _ => text.trim().to_string(),
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

fn read_error(err: &io::Error) -> DeliveryError {
    if is_timeout(err) {
        DeliveryError::Timeout
    } else {
        DeliveryError::Transport(err.to_string())
    }
}

fn transport_error(transport: &ureq::Transport) -> DeliveryError {
    let timed_out = std::error::Error::source(transport)
        .and_then(|source| source.downcast_ref::<io::Error>())
        .is_some_and(is_timeout);

    if timed_out {
        DeliveryError::Timeout
    } else {
        DeliveryError::Transport(transport.to_string())
    }
}
