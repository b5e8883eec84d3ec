//! Outcome of one SDK call.
//!
//! # Design
//! Every resource method returns a fresh `Operation`, so the mutable state
//! below is never shared between calls. The three failure sources (rejected
//! payload, no HTTP response, non-2xx response) become one `OperationError`
//! tagged with its `ErrorKind`; nothing is raised to the caller.

use std::fmt;

use serde_json::Value;

use crate::error::TransportError;
use crate::http::HttpResponse;
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Transport,
    Provider,
    Configuration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationError {
    /// The payload failed its rules; no request was sent.
    Validation(ValidationErrors),
    /// No HTTP response was obtained.
    Transport(String),
    /// The provider answered with a non-2xx status. `body` is the decoded
    /// JSON, or the raw text when the body is not JSON.
    Provider { status: u16, body: Value },
    /// Unknown endpoint or an unserializable payload.
    Configuration(String),
}

impl OperationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OperationError::Validation(_) => ErrorKind::Validation,
            OperationError::Transport(_) => ErrorKind::Transport,
            OperationError::Provider { .. } => ErrorKind::Provider,
            OperationError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    pub fn provider(response: &HttpResponse) -> Self {
        OperationError::Provider {
            status: response.status,
            body: response.json().unwrap_or_else(|| Value::String(response.body.clone())),
        }
    }

    /// Normalized error value.
    ///
    /// Field maps pass through unchanged. A provider body or message that
    /// carries a JSON `"message"` string collapses to that string; anything
    /// else is returned as stored.
    pub fn normalized(&self) -> Value {
        match self {
            OperationError::Validation(errors) => errors.to_value(),
            OperationError::Transport(message) | OperationError::Configuration(message) => {
                Value::String(extract_message(message).unwrap_or_else(|| message.clone()))
            }
            OperationError::Provider { body, .. } => match body {
                Value::String(raw) => Value::String(extract_message(raw).unwrap_or_else(|| raw.clone())),
                Value::Object(map) => match map.get("message") {
                    Some(Value::String(message)) => Value::String(message.clone()),
                    _ => body.clone(),
                },
                other => other.clone(),
            },
        }
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationError::Validation(errors) => write!(f, "validation failed: {errors}"),
            OperationError::Transport(message) => write!(f, "transport error: {message}"),
            OperationError::Configuration(message) => write!(f, "configuration error: {message}"),
            OperationError::Provider { status, .. } => match self.normalized() {
                Value::String(message) => write!(f, "provider returned {status}: {message}"),
                other => write!(f, "provider returned {status}: {other}"),
            },
        }
    }
}

impl std::error::Error for OperationError {}

impl From<ValidationErrors> for OperationError {
    fn from(errors: ValidationErrors) -> Self {
        OperationError::Validation(errors)
    }
}

impl From<TransportError> for OperationError {
    fn from(error: TransportError) -> Self {
        OperationError::Transport(error.to_string())
    }
}

/// Pull the `"message"` string out of text that contains a JSON object.
///
/// Returns `None` when no complete object with a string `message` is found.
pub fn extract_message(text: &str) -> Option<String> {
    let message_of = |candidate: &str| match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => match map.get("message") {
            Some(Value::String(message)) => Some(message.clone()),
            _ => None,
        },
        _ => None,
    };

    if let Some(message) = message_of(text.trim()) {
        return Some(message);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    message_of(&text[start..=end])
}

/// Receives the outcome of a dispatched request.
pub trait ResultSink {
    fn mark_success(&mut self, response: HttpResponse) -> &mut Self;
    fn mark_error(&mut self, error: OperationError) -> &mut Self;
}

/// Success flag, raw response, extracted `data`, and error of one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationState {
    success: bool,
    response: Option<HttpResponse>,
    data: Option<Value>,
    error: Option<OperationError>,
}

impl OperationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&OperationError> {
        self.error.as_ref()
    }

    /// Store a non-2xx response and classify it as a provider error.
    pub fn mark_rejected(&mut self, response: HttpResponse) -> &mut Self {
        let error = OperationError::provider(&response);
        self.response = Some(response);
        self.mark_error(error)
    }
}

impl ResultSink for OperationState {
    fn mark_success(&mut self, response: HttpResponse) -> &mut Self {
        self.data = match response.json() {
            Some(Value::Object(mut body)) => body.remove("data"),
            _ => None,
        };
        self.response = Some(response);
        self.error = None;
        self.success = true;
        self
    }

    fn mark_error(&mut self, error: OperationError) -> &mut Self {
        self.error = Some(error);
        self.data = None;
        self.success = false;
        self
    }
}

/// The value returned by every resource method.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    endpoint: String,
    state: OperationState,
}

impl Operation {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), state: OperationState::new() }
    }

    /// Logical endpoint name this operation targeted.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn state(&self) -> &OperationState {
        &self.state
    }

    pub fn success(&self) -> bool {
        self.state.success()
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.state.response()
    }

    pub fn data(&self) -> Option<&Value> {
        self.state.data()
    }

    pub fn error(&self) -> Option<&OperationError> {
        self.state.error()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.state.error().map(OperationError::kind)
    }

    /// Normalized error, see `OperationError::normalized`.
    pub fn errors(&self) -> Option<Value> {
        self.state.error().map(OperationError::normalized)
    }

    /// Full decoded response body on success.
    pub fn body(&self) -> Option<Value> {
        self.state.response().and_then(HttpResponse::json)
    }

    /// Provider's top-level `message` field, when the response had one.
    pub fn message(&self) -> Option<String> {
        match self.body()? {
            Value::Object(mut map) => match map.remove("message") {
                Some(Value::String(message)) => Some(message),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<Option<Value>, OperationError> {
        match self.state.error {
            Some(error) => Err(error),
            None => Ok(self.state.data),
        }
    }

    pub(crate) fn state_mut(&mut self) -> &mut OperationState {
        &mut self.state
    }
}

impl ResultSink for Operation {
    fn mark_success(&mut self, response: HttpResponse) -> &mut Self {
        self.state.mark_success(response);
        self
    }

    fn mark_error(&mut self, error: OperationError) -> &mut Self {
        self.state.mark_error(error);
        self
    }
}
