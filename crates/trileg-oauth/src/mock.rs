//! Mock transport implementation for testing.
//!
//! Provides [`MockTransport`] for exercising the flow without network access.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::OAuthError;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Mock transport for testing.
///
/// Replays queued responses in order and records every request it receives.
///
/// # Example
///
/// ```ignore
/// use trileg_oauth::MockTransport;
///
/// let transport = MockTransport::new()
///     .with_response(200, "oauth_token=T1&oauth_token_secret=S1")
///     .with_response(200, r#"{"id":1}"#);
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, OAuthError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    /// Create a mock with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_response(self, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.to_owned(),
        }));
        self
    }

    /// Queue a transport error.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_error(self, error: OAuthError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Requests received so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpTransport for MockTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, OAuthError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OAuthError::Transport("no mock response queued".to_owned())))
    }
}

/// Split a recorded request's `Authorization` header into the signed
/// parameters and the `oauth_signature` value.
#[cfg(test)]
pub(crate) fn signed_parameters(request: &HttpRequest) -> (Vec<(String, String)>, String) {
    use percent_encoding::percent_decode_str;

    let decode = |s: &str| percent_decode_str(s).decode_utf8_lossy().into_owned();
    let mut params: Vec<(String, String)> = request
        .header("Authorization")
        .unwrap()
        .trim_start_matches("OAuth ")
        .split(", ")
        .filter_map(|part| part.split_once('='))
        .map(|(k, v)| (decode(k), decode(v.trim_matches('"'))))
        .collect();
    let position = params
        .iter()
        .position(|(k, _)| k == "oauth_signature")
        .unwrap();
    let (_, signature) = params.remove(position);
    (params, signature)
}
