//! HTTP transport used by the token exchange client.
//!
//! [`HttpTransport`] is the only place the core touches the network.
//! [`UreqTransport`] is the production implementation; the `mock` feature
//! adds an in-memory one for tests.

use std::time::Duration;

use ureq::Agent;

use crate::error::OAuthError;

/// HTTP method used by the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    /// Upper-case method name as used in the signature base string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Outgoing HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL including query string.
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Form-encoded body fields (`None` sends an empty body).
    pub form: Option<Vec<(String, String)>>,
}

impl HttpRequest {
    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response status and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes HTTP requests for the flow.
///
/// Implementations must return `Ok` for any response that arrived,
/// whatever its status; status handling is the caller's job.
pub trait HttpTransport: Send + Sync {
    /// Send a request and read the full response body.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::Timeout`] or [`OAuthError::Transport`] when no
    /// response arrives, and [`OAuthError::MalformedResponse`] when the body
    /// cannot be read as text.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, OAuthError>;
}

/// Blocking transport backed by a `ureq` agent.
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Create a transport with a global per-request timeout.
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl HttpTransport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, OAuthError> {
        let response = match request.method {
            Method::Get => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()?
            }
            Method::Post => {
                let mut builder = self.agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.form {
                    Some(form) => {
                        builder.send_form(form.iter().map(|(k, v)| (k.as_str(), v.as_str())))?
                    }
                    None => builder.send_empty()?,
                }
            }
        };

        let status = response.status().as_u16();
        let mut body_reader = response.into_body();
        let body = body_reader.read_to_string().map_err(|e| match e {
            ureq::Error::Timeout(_) => OAuthError::Timeout,
            other => OAuthError::MalformedResponse(format!("Failed to read response: {other}")),
        })?;

        Ok(HttpResponse { status, body })
    }
}
