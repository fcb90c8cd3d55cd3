//! Consumer credentials and token types.

use std::collections::HashMap;
use std::fmt;

use percent_encoding::percent_decode_str;

/// Application credentials, fixed for the lifetime of a client.
#[derive(Clone)]
pub struct Credentials {
    consumer_key: String,
    consumer_secret: String,
    callback_url: String,
}

impl Credentials {
    /// Create credentials.
    ///
    /// # Arguments
    /// * `consumer_key` - Consumer API key
    /// * `consumer_secret` - Consumer API secret
    /// * `callback_url` - URL the provider redirects to after authorization
    ///   (`oob` for the PIN flow)
    pub fn new(consumer_key: &str, consumer_secret: &str, callback_url: &str) -> Self {
        Self {
            consumer_key: consumer_key.to_owned(),
            consumer_secret: consumer_secret.to_owned(),
            callback_url: callback_url.to_owned(),
        }
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    pub fn consumer_secret(&self) -> &str {
        &self.consumer_secret
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("callback_url", &self.callback_url)
            .finish()
    }
}

/// Parse OAuth URL-encoded response body.
pub(crate) fn parse_oauth_response(body: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in body.trim().split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            params.insert(
                percent_decode_str(key).decode_utf8_lossy().into_owned(),
                percent_decode_str(value).decode_utf8_lossy().into_owned(),
            );
        }
    }
    params
}

/// Extract `(oauth_token, oauth_token_secret)` from a response body.
///
/// A missing or empty `oauth_token` leaves both fields empty.
fn token_pair(body: &str) -> (String, String) {
    let mut params = parse_oauth_response(body);
    match params.remove("oauth_token") {
        Some(token) if !token.is_empty() => {
            let secret = params.remove("oauth_token_secret").unwrap_or_default();
            (token, secret)
        }
        _ => (String::new(), String::new()),
    }
}

/// Temporary credentials from the request-token step.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct RequestToken {
    pub oauth_token: String,
    pub oauth_token_secret: String,
}

impl RequestToken {
    /// Create a request token from known values.
    pub fn new(oauth_token: &str, oauth_token_secret: &str) -> Self {
        Self {
            oauth_token: oauth_token.to_owned(),
            oauth_token_secret: oauth_token_secret.to_owned(),
        }
    }

    /// Parse an `application/x-www-form-urlencoded` token response.
    ///
    /// Never fails: a body without `oauth_token` yields an invalid token.
    pub fn from_response_body(body: &str) -> Self {
        let (oauth_token, oauth_token_secret) = token_pair(body);
        Self {
            oauth_token,
            oauth_token_secret,
        }
    }

    /// Whether the provider issued a token.
    pub fn is_valid(&self) -> bool {
        !self.oauth_token.is_empty()
    }
}

impl fmt::Debug for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestToken")
            .field("oauth_token", &self.oauth_token)
            .field("oauth_token_secret", &"<redacted>")
            .finish()
    }
}

/// User-authorized credentials from the access-token step.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct AccessToken {
    pub oauth_token: String,
    pub oauth_token_secret: String,
}

impl AccessToken {
    /// Parse an `application/x-www-form-urlencoded` token response.
    ///
    /// Extra fields such as `user_id` and `screen_name` are ignored.
    pub fn from_response_body(body: &str) -> Self {
        let (oauth_token, oauth_token_secret) = token_pair(body);
        Self {
            oauth_token,
            oauth_token_secret,
        }
    }

    /// Whether the provider issued a token.
    pub fn is_valid(&self) -> bool {
        !self.oauth_token.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("oauth_token", &self.oauth_token)
            .field("oauth_token_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_oauth_response() {
        let body = "oauth_token=abc123&oauth_token_secret=xyz789&oauth_callback_confirmed=true";
        let params = parse_oauth_response(body);

        assert_eq!(params.get("oauth_token"), Some(&"abc123".to_owned()));
        assert_eq!(
            params.get("oauth_token_secret"),
            Some(&"xyz789".to_owned())
        );
        assert_eq!(
            params.get("oauth_callback_confirmed"),
            Some(&"true".to_owned())
        );
    }

    #[test]
    fn test_parse_oauth_response_with_encoded_values() {
        let body = "oauth_token=abc%2B123&oauth_token_secret=xyz%3D789";
        let params = parse_oauth_response(body);

        assert_eq!(params.get("oauth_token"), Some(&"abc+123".to_owned()));
        assert_eq!(
            params.get("oauth_token_secret"),
            Some(&"xyz=789".to_owned())
        );
    }

    #[test]
    fn test_request_token_from_body() {
        let token = RequestToken::from_response_body("oauth_token=abc&oauth_token_secret=xyz");

        assert_eq!(token, RequestToken::new("abc", "xyz"));
        assert!(token.is_valid());
    }

    #[test]
    fn test_request_token_from_empty_body_is_invalid() {
        let token = RequestToken::from_response_body("");
        assert!(!token.is_valid());
        assert_eq!(token.oauth_token_secret, "");
    }

    #[test]
    fn test_request_token_without_token_is_invalid() {
        let token = RequestToken::from_response_body("oauth_token_secret=xyz&foo=bar");
        assert!(!token.is_valid());
        assert_eq!(token.oauth_token_secret, "");
    }

    #[test]
    fn test_request_token_with_empty_token_is_invalid() {
        let token = RequestToken::from_response_body("oauth_token=&oauth_token_secret=xyz");
        assert!(!token.is_valid());
    }

    #[test]
    fn test_non_form_body_is_invalid() {
        let token = RequestToken::from_response_body(r#"{"errors":[{"code":32}]}"#);
        assert!(!token.is_valid());
    }

    #[test]
    fn test_access_token_ignores_extra_fields() {
        let token = AccessToken::from_response_body(
            "oauth_token=T2&oauth_token_secret=S2&user_id=42&screen_name=someone\n",
        );

        assert_eq!(token.oauth_token, "T2");
        assert_eq!(token.oauth_token_secret, "S2");
        assert!(token.is_valid());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credentials = Credentials::new("ck", "very-secret", "oob");
        let token = AccessToken::from_response_body("oauth_token=T&oauth_token_secret=hidden");

        let rendered = format!("{credentials:?} {token:?}");
        assert!(rendered.contains("ck"));
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("hidden"));
    }
}
