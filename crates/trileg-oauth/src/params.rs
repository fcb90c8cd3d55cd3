//! OAuth protocol parameter assembly and serialization.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::distr::{Alphanumeric, Distribution};

use crate::error::Step;
use crate::signature::{SignatureEngine, percent_encode};
use crate::token::Credentials;

/// Length of generated nonces.
const NONCE_LEN: usize = 32;

const OAUTH_VERSION: &str = "1.0";
const SIGNATURE_METHOD: &str = "HMAC-SHA1";

/// Generate a random alphanumeric nonce from the thread-local CSPRNG.
fn generate_nonce() -> String {
    Alphanumeric
        .sample_iter(rand::rng())
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

/// Generate Unix timestamp.
fn generate_timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .to_string()
}

/// Signed OAuth parameters for one request, in construction order.
///
/// The last entry is always `oauth_signature`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthParameters {
    params: Vec<(String, String)>,
}

impl AuthParameters {
    /// Look up a parameter value by name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over `(name, value)` pairs in construction order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Build the `Authorization` header value.
    ///
    /// Format: `OAuth k1="v1", k2="v2", ...`
    pub fn authorization_header(&self) -> String {
        let header_parts: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect();
        format!("OAuth {}", header_parts.join(", "))
    }

    /// Build an unquoted `k1=v1&k2=v2` query string.
    pub fn query_string(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Assembles and signs the OAuth parameter set for each protocol step.
pub struct AuthParameterBuilder<'a> {
    credentials: &'a Credentials,
    engine: &'a SignatureEngine,
    fixed: Option<(String, String)>,
}

impl<'a> AuthParameterBuilder<'a> {
    /// Create a builder generating a fresh nonce and timestamp per call.
    pub fn new(credentials: &'a Credentials, engine: &'a SignatureEngine) -> Self {
        Self {
            credentials,
            engine,
            fixed: None,
        }
    }

    /// Use the given nonce and timestamp instead of generated ones.
    #[must_use]
    pub fn with_nonce_and_timestamp(mut self, nonce: &str, timestamp: &str) -> Self {
        self.fixed = Some((nonce.to_owned(), timestamp.to_owned()));
        self
    }

    /// Build signed parameters for a protocol step.
    ///
    /// # Arguments
    /// * `step` - Protocol step, selects the parameter set
    /// * `method` - Upper-case HTTP method
    /// * `request_path` - Path relative to the provider base URL
    /// * `token` - Current token (ignored for the request-token step)
    /// * `token_secret` - Secret used in the signing key (empty if none)
    pub fn build(
        &self,
        step: Step,
        method: &str,
        request_path: &str,
        token: Option<&str>,
        token_secret: &str,
    ) -> AuthParameters {
        let (nonce, timestamp) = self
            .fixed
            .clone()
            .unwrap_or_else(|| (generate_nonce(), generate_timestamp()));
        let consumer_key = self.credentials.consumer_key().to_owned();

        let mut params: Vec<(String, String)> = Vec::with_capacity(8);
        let mut push = |key: &str, value: String| params.push((key.to_owned(), value));

        match step {
            Step::RequestToken => {
                push("oauth_nonce", nonce);
                push("oauth_callback", self.credentials.callback_url().to_owned());
                push("oauth_signature_method", SIGNATURE_METHOD.to_owned());
                push("oauth_timestamp", timestamp);
                push("oauth_consumer_key", consumer_key);
                push("oauth_version", OAUTH_VERSION.to_owned());
            }
            Step::AccessToken => {
                push("oauth_consumer_key", consumer_key);
                push("oauth_nonce", nonce);
                push("oauth_signature_method", SIGNATURE_METHOD.to_owned());
                push("oauth_timestamp", timestamp);
                if let Some(token) = token {
                    push("oauth_token", token.to_owned());
                }
                push("oauth_version", OAUTH_VERSION.to_owned());
            }
            Step::VerifyCredentials => {
                push("oauth_consumer_key", consumer_key);
                push("oauth_nonce", nonce);
                push("oauth_signature_method", SIGNATURE_METHOD.to_owned());
                if let Some(token) = token {
                    push("oauth_token", token.to_owned());
                }
                push("oauth_timestamp", timestamp);
                push("oauth_version", OAUTH_VERSION.to_owned());
                // Extended profile; the app must be allowed to request email.
                push("include_email", "true".to_owned());
            }
        }

        let signature = self.engine.sign(
            method,
            &params,
            request_path,
            token_secret,
            self.credentials.consumer_secret(),
        );
        tracing::debug!(%step, method, path = request_path, "Signed OAuth parameters");
        params.push(("oauth_signature".to_owned(), signature));

        AuthParameters { params }
    }
}
