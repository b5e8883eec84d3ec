//! Blocking client core for the Paystack payments API.
//!
//! # Overview
//! Every call follows one path: build a payload, validate it against a
//! declarative rule set, substitute the identifier into a path template,
//! send the request over a retrying transport, and capture the outcome in an
//! `Operation` the caller inspects.
//!
//! # Design
//! - `ApiClient<T: Transport>` holds configuration, the endpoint table and the
//!   transport; it is immutable and shareable across threads.
//! - Requests are plain `HttpRequest` values, so the network seam
//!   (`Transport`) can be replaced by a mock in tests.
//! - Resource groups (`client.customer()`, `client.transfer()`, ...) are thin
//!   borrowed views that pair each payload with its rules.
//! - Errors never panic out of an operation: validation, transport, provider
//!   and configuration failures are all stored on the returned `Operation`.

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod operation;
pub mod resources;
pub mod retry;
pub mod template;
pub mod transport;
pub mod types;
pub mod validation;

pub use client::{to_payload, ApiClient, ResourceRequest};
pub use config::{Config, SecretKey};
pub use endpoints::EndpointTable;
pub use error::{ConfigError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use operation::{ErrorKind, Operation, OperationError, OperationState, ResultSink};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, Transport};
pub use validation::{CustomMessages, Payload, Rule, RuleSet, Schema, ValidationErrors, ValidationResult, Validator};
