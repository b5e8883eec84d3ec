//! Templated-resource dispatcher.
//!
//! # Design
//! `ApiClient` is immutable after construction: configuration, endpoint
//! table, retry policy and transport are fixed, so one client can be shared
//! across threads. Each call flows through `dispatch`:
//!
//! 1. validate the payload (a rejected payload never reaches the transport),
//! 2. look up the endpoint template and substitute the path parameter,
//! 3. `build_request` attaches auth/accept headers and encodes the payload,
//! 4. `send` executes it under the retry policy,
//! 5. the response is classified into a fresh `Operation`.

use std::borrow::Cow;
use std::fmt::Display;

use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::endpoints::EndpointTable;
use crate::error::{ConfigError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::operation::{Operation, OperationError, ResultSink};
use crate::retry::RetryPolicy;
use crate::template;
use crate::transport::{HttpTransport, Transport};
use crate::validation::{Payload, ValidationResult, Validator};

const FIXED_HEADERS: [&str; 2] = ["authorization", "accept"];

/// One call against a named endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRequest {
    /// Endpoint name from the table, or a literal template starting with `/`.
    pub endpoint: String,
    pub path_param: Option<String>,
    /// Field name under which `path_param` is validated. It is never sent.
    pub path_field: Option<String>,
    pub method: HttpMethod,
    pub body: Payload,
    pub headers: Vec<(String, String)>,
}

impl ResourceRequest {
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            path_param: None,
            path_field: None,
            method,
            body: Payload::new(),
            headers: Vec::new(),
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, endpoint)
    }

    pub fn path_param(mut self, param: impl Display) -> Self {
        self.path_param = Some(param.to_string());
        self
    }

    /// Path parameter that is also checked as field `field` of the payload.
    pub fn path_param_as(mut self, field: impl Into<String>, param: impl Display) -> Self {
        self.path_field = Some(field.into());
        self.path_param(param)
    }

    /// The map the validator sees: the body plus the named path parameter.
    pub fn validation_view(&self) -> Cow<'_, Payload> {
        match (&self.path_field, &self.path_param) {
            (Some(field), param) => {
                let mut view = self.body.clone();
                let value = param.clone().map(Value::String).unwrap_or(Value::Null);
                view.insert(field.clone(), value);
                Cow::Owned(view)
            }
            (None, _) => Cow::Borrowed(&self.body),
        }
    }

    pub fn body(mut self, body: Payload) -> Self {
        self.body = body;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Serialize a typed request into a payload map.
pub fn to_payload<T: Serialize>(value: &T) -> Result<Payload, OperationError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(OperationError::Configuration(format!(
            "request must serialize to an object, got {other}"
        ))),
        Err(err) => Err(OperationError::Configuration(format!("serialization failed: {err}"))),
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient<T: Transport = HttpTransport> {
    config: Config,
    endpoints: EndpointTable,
    retry: RetryPolicy,
    transport: T,
}

impl ApiClient<HttpTransport> {
    /// Client over HTTP with the bundled endpoint table.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = HttpTransport::from_config(&config);
        Ok(Self::with_transport(config, transport))
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(Config::from_env()?)
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(config: Config, transport: T) -> Self {
        let retry = config.retry_policy();
        Self { config, endpoints: EndpointTable::bundled(), retry, transport }
    }

    /// Replace the endpoint table.
    pub fn with_endpoints(mut self, endpoints: EndpointTable) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn endpoints(&self) -> &EndpointTable {
        &self.endpoints
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Absolute URL for a resolved path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Path template for `endpoint`, which may itself be a literal template.
    pub fn template<'a>(&'a self, endpoint: &'a str) -> Result<&'a str, ConfigError> {
        if endpoint.starts_with('/') {
            return Ok(endpoint);
        }
        self.endpoints.get(endpoint)
    }

    /// Build the wire request: fixed headers first, then configured and
    /// caller headers that do not collide with them.
    pub fn build_request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Payload>,
        headers: &[(String, String)],
    ) -> Result<HttpRequest, TransportError> {
        let mut all_headers = vec![
            (
                "Authorization".to_owned(),
                format!("Bearer {}", self.config.secret_key.expose()),
            ),
            ("Accept".to_owned(), "application/json".to_owned()),
        ];

        let body = body.filter(|payload| !payload.is_empty());
        let (query, encoded) = match (method, body) {
            (HttpMethod::Get, Some(payload)) => (query_pairs(payload), None),
            (_, Some(payload)) => {
                let encoded = serde_json::to_string(payload)
                    .map_err(|e| TransportError::Other(format!("serialization failed: {e}")))?;
                all_headers.push(("Content-Type".to_owned(), "application/json".to_owned()));
                (Vec::new(), Some(encoded))
            }
            (_, None) => (Vec::new(), None),
        };

        let extra = self
            .config
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .chain(headers.iter().map(|(name, value)| (name.as_str(), value.as_str())));
        for (name, value) in extra {
            if FIXED_HEADERS.iter().any(|fixed| fixed.eq_ignore_ascii_case(name)) {
                tracing::debug!(header = name, "ignoring override of fixed header");
                continue;
            }
            all_headers.push((name.to_owned(), value.to_owned()));
        }

        Ok(HttpRequest {
            method,
            url: url.to_owned(),
            headers: all_headers,
            query,
            body: encoded,
        })
    }

    /// Issue one request, retrying connection-level failures.
    pub fn send(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Payload>,
        headers: &[(String, String)],
    ) -> Result<HttpResponse, TransportError> {
        let request = self.build_request(method, url, body, headers)?;
        self.retry.run(method, || self.transport.execute(&request))
    }

    /// Validate, resolve and send `request`, capturing the outcome.
    pub fn dispatch(&self, request: ResourceRequest, validator: &dyn Validator) -> Operation {
        let mut operation = Operation::new(request.endpoint.as_str());

        if let ValidationResult::Invalid(errors) = validator.validate(&request.validation_view()) {
            tracing::debug!(endpoint = %request.endpoint, fields = errors.len(), "payload rejected");
            operation.mark_error(OperationError::Validation(errors));
            return operation;
        }

        let template = match self.template(&request.endpoint) {
            Ok(template) => template,
            Err(err) => {
                operation.mark_error(OperationError::Configuration(err.to_string()));
                return operation;
            }
        };
        let path = template::resolve(template, request.path_param.as_deref());
        if template::has_placeholder(&path) {
            operation.mark_error(OperationError::Configuration(format!(
                "endpoint {} requires a path parameter",
                request.endpoint
            )));
            return operation;
        }

        let url = self.url(&path);
        tracing::debug!(endpoint = %request.endpoint, method = %request.method, %url, "dispatching");

        match self.send(request.method, &url, Some(&request.body), &request.headers) {
            Ok(response) if response.is_success() => {
                operation.mark_success(response);
            }
            Ok(response) => {
                tracing::debug!(endpoint = %request.endpoint, status = response.status, "provider rejected request");
                operation.state_mut().mark_rejected(response);
            }
            Err(error) => {
                tracing::error!(endpoint = %request.endpoint, error = %error, "request failed");
                operation.mark_error(error.into());
            }
        }
        operation
    }
}

/// GET payloads travel as query parameters; nested values are JSON-encoded.
fn query_pairs(payload: &Payload) -> Vec<(String, String)> {
    payload
        .iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                nested => nested.to_string(),
            };
            Some((key.clone(), rendered))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockall::{mock, predicate::always, Sequence};
    use serde_json::json;

    use super::*;
    use crate::operation::ErrorKind;
    use crate::validation::{Rule, RuleSet, Schema};

    mock! {
        pub Wire {}
        impl Transport for Wire {
            fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
        }
    }

    fn config() -> Config {
        let mut config = Config::new("sk_test_secret");
        config.base_url = "https://api.example.test/".to_owned();
        config.retry_delay_ms = 1;
        config
    }

    fn ok(body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse { status: 200, headers: Vec::new(), body: body.to_owned() })
    }

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    fn email_schema() -> Schema {
        Schema::new(RuleSet::new().field("email", [Rule::Required, Rule::Email]))
    }

    #[test]
    fn invalid_payload_never_reaches_transport() {
        let mut wire = MockWire::new();
        wire.expect_execute().never();
        let client = ApiClient::with_transport(config(), wire);

        let op = client.dispatch(
            ResourceRequest::post("customer.create").body(payload(json!({"email": "nope"}))),
            &email_schema(),
        );

        assert!(!op.success());
        assert_eq!(op.error_kind(), Some(ErrorKind::Validation));
        assert!(op.data().is_none());
    }

    #[test]
    fn success_resolves_template_and_sets_headers() {
        let mut wire = MockWire::new();
        wire.expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Get
                    && req.url == "https://api.example.test/customer/CUS_123"
                    && req.header("authorization") == Some("Bearer sk_test_secret")
                    && req.header("accept") == Some("application/json")
                    && req.body.is_none()
            })
            .times(1)
            .returning(|_| ok(r#"{"status":true,"data":{"id":1}}"#));
        let client = ApiClient::with_transport(config(), wire);

        let op = client.dispatch(ResourceRequest::get("customer.fetch").path_param("CUS_123"), &Schema::none());

        assert!(op.success());
        assert_eq!(op.data(), Some(&json!({"id": 1})));
        assert!(op.error().is_none());
    }

    #[test]
    fn get_payload_becomes_query_and_post_payload_becomes_json() {
        let client = ApiClient::with_transport(config(), MockWire::new());
        let body = payload(json!({"perPage": 50, "page": 1, "skip": null}));

        let get = client.build_request(HttpMethod::Get, "https://x/customer", Some(&body), &[]).unwrap();
        assert!(get.body.is_none());
        assert!(get.query.contains(&("perPage".to_owned(), "50".to_owned())));
        assert!(!get.query.iter().any(|(k, _)| k == "skip"));

        let post = client.build_request(HttpMethod::Post, "https://x/customer", Some(&body), &[]).unwrap();
        assert!(post.query.is_empty());
        assert_eq!(post.header("content-type"), Some("application/json"));
        let sent: Value = serde_json::from_str(post.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent["perPage"], 50);
    }

    #[test]
    fn extra_headers_cannot_replace_fixed_ones() {
        let mut config = config();
        config.headers.insert("X-Source".to_owned(), "billing".to_owned());
        let client = ApiClient::with_transport(config, MockWire::new());
        let extra = vec![
            ("authorization".to_owned(), "Bearer stolen".to_owned()),
            ("X-Trace".to_owned(), "abc".to_owned()),
        ];

        let req = client.build_request(HttpMethod::Post, "https://x/transfer", None, &extra).unwrap();

        assert_eq!(req.header("Authorization"), Some("Bearer sk_test_secret"));
        assert_eq!(req.headers.iter().filter(|(k, _)| k.eq_ignore_ascii_case("authorization")).count(), 1);
        assert_eq!(req.header("x-source"), Some("billing"));
        assert_eq!(req.header("x-trace"), Some("abc"));
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn provider_error_is_captured_not_retried() {
        let mut wire = MockWire::new();
        wire.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 400,
                headers: Vec::new(),
                body: r#"{"status":false,"message":"invalid email"}"#.to_owned(),
            })
        });
        let client = ApiClient::with_transport(config(), wire);

        let op = client.dispatch(
            ResourceRequest::post("customer.create").body(payload(json!({"email": "a@b.co"}))),
            &email_schema(),
        );

        assert!(!op.success());
        assert_eq!(op.error_kind(), Some(ErrorKind::Provider));
        assert_eq!(op.errors(), Some(json!("invalid email")));
    }

    #[test]
    fn transport_failure_is_retried_then_reported() {
        let mut wire = MockWire::new();
        wire.expect_execute()
            .with(always())
            .times(4)
            .returning(|_| Err(TransportError::Timeout("connect".into())));
        let mut config = config();
        config.retry_delay_ms = 15;
        let client = ApiClient::with_transport(config, wire);

        let started = std::time::Instant::now();
        let op = client.dispatch(ResourceRequest::get("misc.banks"), &Schema::none());

        assert!(started.elapsed() >= Duration::from_millis(45));
        assert_eq!(op.error_kind(), Some(ErrorKind::Transport));
        assert_eq!(op.errors(), Some(json!("request timed out: connect")));
    }

    #[test]
    fn recovers_when_a_retry_succeeds() {
        let mut seq = Sequence::new();
        let mut wire = MockWire::new();
        wire.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(TransportError::Connect("refused".into())));
        wire.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| ok(r#"{"data":[]}"#));
        let client = ApiClient::with_transport(config(), wire);

        let op = client.dispatch(ResourceRequest::get("misc.banks"), &Schema::none());
        assert!(op.success());
        assert_eq!(op.data(), Some(&json!([])));
    }

    #[test]
    fn unknown_endpoint_is_a_configuration_error() {
        let mut wire = MockWire::new();
        wire.expect_execute().never();
        let client = ApiClient::with_transport(config(), wire);

        let op = client.dispatch(ResourceRequest::get("customer.teleport"), &Schema::none());
        assert_eq!(op.error_kind(), Some(ErrorKind::Configuration));
    }

    #[test]
    fn missing_path_param_is_caught_before_sending() {
        let mut wire = MockWire::new();
        wire.expect_execute().never();
        let client = ApiClient::with_transport(config(), wire);

        let op = client.dispatch(ResourceRequest::get("customer.fetch"), &Schema::none());
        assert_eq!(op.error_kind(), Some(ErrorKind::Configuration));
    }

    #[test]
    fn literal_templates_and_custom_tables_are_supported() {
        let mut wire = MockWire::new();
        wire.expect_execute()
            .withf(|req| req.url == "https://api.example.test/v2/banks")
            .times(2)
            .returning(|_| ok("{}"));
        let mut table = EndpointTable::empty();
        table.insert("misc.banks", "/v2/banks");
        let client = ApiClient::with_transport(config(), wire).with_endpoints(table);

        assert!(client.dispatch(ResourceRequest::get("misc.banks"), &Schema::none()).success());
        assert!(client.dispatch(ResourceRequest::get("/v2/banks"), &Schema::none()).success());
    }

    #[test]
    fn path_field_is_validated_but_not_sent() {
        let mut wire = MockWire::new();
        wire.expect_execute()
            .withf(|req| req.query.is_empty() && req.url.ends_with("/paymentrequest/INV_1"))
            .times(1)
            .returning(|_| ok("{}"));
        let client = ApiClient::with_transport(config(), wire);
        let schema = Schema::new(RuleSet::new().field("invoice_id", [Rule::Required, Rule::String]));

        let blank = client.dispatch(ResourceRequest::get("invoice.fetch").path_param_as("invoice_id", " "), &schema);
        assert_eq!(blank.error_kind(), Some(ErrorKind::Validation));

        let sent = client.dispatch(ResourceRequest::get("invoice.fetch").path_param_as("invoice_id", "INV_1"), &schema);
        assert!(sent.success());
    }

    #[test]
    fn to_payload_rejects_non_objects() {
        assert!(to_payload(&json!({"a": 1})).is_ok());
        let err = to_payload(&vec![1, 2]).unwrap_err();
        assert!(matches!(err, OperationError::Configuration(_)));
    }
}
