//! Network execution of `HttpRequest` values.
//!
//! # Design
//! `Transport::execute` performs exactly one attempt and reports either a
//! response (any status) or a connection-level `TransportError`. Retrying
//! lives in `RetryPolicy`, above this seam, so the retry loop can be driven
//! by a mock transport in tests.

use std::{io, sync::Arc, time::Duration};

use tracing::instrument;

use crate::config::Config;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Upper bound for a whole request once connected.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes a single HTTP round-trip.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
///
/// Non-2xx statuses are returned as responses, never as errors, so the
/// operation layer can classify them.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(Some(connect_timeout))
            .timeout_global(Some(DEFAULT_READ_TIMEOUT.max(connect_timeout)))
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.timeout())
    }
}

impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(request.url.as_str());
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                for (key, value) in &request.query {
                    builder = builder.query(key, value);
                }
                builder.call()
            }
            HttpMethod::Delete => {
                let mut builder = self.agent.delete(request.url.as_str());
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => builder.force_send_body().send(body.as_bytes()),
                    None => builder.call(),
                }
            }
            HttpMethod::Post => send_with_body(self.agent.post(request.url.as_str()), request),
            HttpMethod::Put => send_with_body(self.agent.put(request.url.as_str()), request),
            HttpMethod::Patch => send_with_body(self.agent.patch(request.url.as_str()), request),
        };

        let mut response = result.map_err(classify)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (name.as_str().to_owned(), value.to_str().unwrap_or_default().to_owned())
            })
            .collect();
        let body = response.body_mut().read_to_string().map_err(classify)?;

        tracing::debug!(status, "response received");
        Ok(HttpResponse { status, headers, body })
    }
}

fn send_with_body(
    mut builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    request: &HttpRequest,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    match &request.body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

fn classify(error: ureq::Error) -> TransportError {
    match error {
        ureq::Error::Timeout(timeout) => TransportError::Timeout(format!("{timeout:?}")),
        ureq::Error::HostNotFound => TransportError::Dns("host not found".to_owned()),
        ureq::Error::ConnectionFailed => TransportError::Connect("connection failed".to_owned()),
        ureq::Error::Io(err) => match err.kind() {
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::NotConnected => TransportError::Connect(err.to_string()),
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportError::Timeout(err.to_string()),
            _ => TransportError::Io(err.to_string()),
        },
        other => {
            let message = other.to_string();
            if message.to_ascii_lowercase().contains("tls") || message.contains("certificate") {
                TransportError::Tls(message)
            } else {
                TransportError::Other(message)
            }
        }
    }
}
