//! Token exchange client.
//!
//! Issues the three signed calls of the flow against the provider.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{OAuthError, Step};
use crate::params::{AuthParameterBuilder, AuthParameters};
use crate::signature::{SignatureEngine, percent_encode};
use crate::token::{AccessToken, Credentials, RequestToken};
use crate::transport::{HttpRequest, HttpTransport, Method, UreqTransport};

/// Provider endpoint layout.
///
/// Paths are relative to `base_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub base_url: String,
    pub request_token_path: String,
    pub authorize_path: String,
    pub access_token_path: String,
    pub verify_credentials_path: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            base_url: "https://api.twitter.com".to_owned(),
            request_token_path: "oauth/request_token".to_owned(),
            authorize_path: "oauth/authorize".to_owned(),
            access_token_path: "oauth/access_token".to_owned(),
            verify_credentials_path: "1.1/account/verify_credentials.json".to_owned(),
        }
    }
}

/// OAuth 1.0a token exchange client.
///
/// Handles the network side of the three-legged flow:
/// 1. Request temporary credentials (request token)
/// 2. Build the authorization URL for the user
/// 3. Exchange the verifier for access credentials
/// 4. Fetch the user's profile with the access credentials
pub struct TokenExchangeClient {
    transport: Arc<dyn HttpTransport>,
    credentials: Credentials,
    endpoints: ProviderEndpoints,
    engine: SignatureEngine,
}

impl TokenExchangeClient {
    /// Create a client using a `ureq` transport with the given timeout.
    pub fn new(credentials: Credentials, endpoints: ProviderEndpoints, timeout: Duration) -> Self {
        Self::with_transport(credentials, endpoints, Arc::new(UreqTransport::new(timeout)))
    }

    /// Create a client over an explicit transport.
    pub fn with_transport(
        credentials: Credentials,
        endpoints: ProviderEndpoints,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let engine = SignatureEngine::new(&endpoints.base_url);
        Self {
            transport,
            credentials,
            endpoints,
            engine,
        }
    }

    /// Step 1: Request temporary credentials.
    ///
    /// A response without `oauth_token` is not an error here; the returned
    /// token is then invalid and the caller decides how to fail.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the provider answers
    /// with a non-2xx status.
    pub fn request_token(&self) -> Result<RequestToken, OAuthError> {
        let path = &self.endpoints.request_token_path;
        let params = self.sign(Step::RequestToken, Method::Post, path, None, "");

        let request = HttpRequest {
            method: Method::Post,
            url: self.engine.request_url(path),
            headers: base_headers(&params),
            form: None,
        };
        let body = self.execute(Step::RequestToken, &request)?;

        let token = RequestToken::from_response_body(&body);
        if token.is_valid() {
            tracing::info!("Request token obtained");
        } else {
            tracing::warn!("Request token response carried no oauth_token");
        }
        Ok(token)
    }

    /// Step 2: Get the user-facing authorization URL for a request token.
    #[must_use]
    pub fn authorize_url(&self, request_token: &RequestToken) -> String {
        format!(
            "{}?oauth_token={}",
            self.engine.request_url(&self.endpoints.authorize_path),
            percent_encode(&request_token.oauth_token)
        )
    }

    /// Step 3: Exchange verifier for access token.
    ///
    /// Signs with the request token's secret, which may be empty when the
    /// caller no longer has it. The verifier travels in the form body and is
    /// repeated in an `oauth_verifier` header.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidToken`] if `request_token` is invalid or
    /// the provider issues no access token, and transport errors otherwise.
    pub fn access_token(
        &self,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken, OAuthError> {
        if !request_token.is_valid() {
            return Err(OAuthError::InvalidToken {
                step: Step::RequestToken,
            });
        }

        let path = &self.endpoints.access_token_path;
        let params = self.sign(
            Step::AccessToken,
            Method::Post,
            path,
            Some(&request_token.oauth_token),
            &request_token.oauth_token_secret,
        );

        let mut headers = base_headers(&params);
        headers.push(("oauth_verifier".to_owned(), verifier.to_owned()));

        let request = HttpRequest {
            method: Method::Post,
            url: self.engine.request_url(path),
            headers,
            form: Some(vec![("oauth_verifier".to_owned(), verifier.to_owned())]),
        };
        let body = self.execute(Step::AccessToken, &request)?;

        let token = AccessToken::from_response_body(&body);
        if !token.is_valid() {
            tracing::warn!("Access token response carried no oauth_token");
            return Err(OAuthError::InvalidToken {
                step: Step::AccessToken,
            });
        }
        tracing::info!("Access token obtained");
        Ok(token)
    }

    /// Step 4: Fetch the authorized user's profile.
    ///
    /// Returns the raw JSON body without interpreting it.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidToken`] for an empty token, and transport
    /// errors otherwise.
    pub fn verify_credentials(
        &self,
        access_token: &str,
        token_secret: &str,
    ) -> Result<String, OAuthError> {
        if access_token.is_empty() {
            return Err(OAuthError::InvalidToken {
                step: Step::AccessToken,
            });
        }

        let path = &self.endpoints.verify_credentials_path;
        let params = self.sign(
            Step::VerifyCredentials,
            Method::Get,
            path,
            Some(access_token),
            token_secret,
        );

        let request = HttpRequest {
            method: Method::Get,
            url: format!("{}?{}", self.engine.request_url(path), params.query_string()),
            headers: base_headers(&params),
            form: None,
        };
        let profile = self.execute(Step::VerifyCredentials, &request)?;
        tracing::info!(bytes = profile.len(), "Profile fetched");
        Ok(profile)
    }

    /// Shared signing path for every step.
    fn sign(
        &self,
        step: Step,
        method: Method,
        path: &str,
        token: Option<&str>,
        token_secret: &str,
    ) -> AuthParameters {
        AuthParameterBuilder::new(&self.credentials, &self.engine).build(
            step,
            method.as_str(),
            path,
            token,
            token_secret,
        )
    }

    /// Send a request and return the body of a 2xx response.
    fn execute(&self, step: Step, request: &HttpRequest) -> Result<String, OAuthError> {
        tracing::debug!(%step, method = request.method.as_str(), "Sending OAuth request");
        let response = self.transport.send(request).inspect_err(|e| {
            tracing::warn!(%step, error = %e, "OAuth request failed");
        })?;

        if !response.is_success() {
            tracing::warn!(%step, status = response.status, "Provider rejected OAuth request");
            return Err(OAuthError::HttpStatus {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response.body)
    }
}

/// Common request headers.
fn base_headers(params: &AuthParameters) -> Vec<(String, String)> {
    vec![
        ("Authorization".to_owned(), params.authorization_header()),
        ("Accept".to_owned(), "application/json".to_owned()),
    ]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ErrorKind;
    use crate::mock::{MockTransport, signed_parameters};

    fn client(transport: &Arc<MockTransport>) -> TokenExchangeClient {
        TokenExchangeClient::with_transport(
            Credentials::new("ck", "cs", "http://127.0.0.1:7980/"),
            ProviderEndpoints {
                base_url: "https://api.example.com".to_owned(),
                ..ProviderEndpoints::default()
            },
            Arc::clone(transport) as Arc<dyn HttpTransport>,
        )
    }

    #[test]
    fn test_request_token_success() {
        let transport = Arc::new(
            MockTransport::new().with_response(200, "oauth_token=T1&oauth_token_secret=S1"),
        );
        let token = client(&transport).request_token().unwrap();

        assert_eq!(token, RequestToken::new("T1", "S1"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "https://api.example.com/oauth/request_token");
        assert!(request.form.is_none());
        assert_eq!(request.header("Accept"), Some("application/json"));

        let auth = request.header("Authorization").unwrap();
        assert!(auth.starts_with("OAuth oauth_nonce="));
        assert!(auth.contains(r#"oauth_callback="http%3A%2F%2F127.0.0.1%3A7980%2F""#));
        assert!(auth.contains(r#"oauth_consumer_key="ck""#));
        assert!(auth.contains("oauth_signature="));
        assert!(!auth.contains("oauth_token="));
    }

    #[test]
    fn test_request_token_without_token_is_invalid_not_error() {
        let transport = Arc::new(MockTransport::new().with_response(200, "foo=bar"));
        let token = client(&transport).request_token().unwrap();

        assert!(!token.is_valid());
    }

    #[test]
    fn test_request_token_non_2xx_is_transport_failure() {
        let transport = Arc::new(MockTransport::new().with_response(401, "Unauthorized"));
        let err = client(&transport).request_token().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_request_token_timeout_is_transport_failure() {
        let transport = Arc::new(MockTransport::new().with_error(OAuthError::Timeout));
        let err = client(&transport).request_token().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TransportFailure);
    }

    #[test]
    fn test_authorize_url() {
        let transport = Arc::new(MockTransport::new());
        let url = client(&transport).authorize_url(&RequestToken::new("T 1", "S1"));

        assert_eq!(url, "https://api.example.com/oauth/authorize?oauth_token=T%201");
    }

    #[test]
    fn test_access_token_sends_verifier_in_body_and_header() {
        let transport = Arc::new(MockTransport::new().with_response(
            200,
            "oauth_token=T2&oauth_token_secret=S2&user_id=1&screen_name=x",
        ));
        let token = client(&transport)
            .access_token(&RequestToken::new("T1", "S1"), "V1")
            .unwrap();

        assert_eq!(token.oauth_token, "T2");
        assert_eq!(token.oauth_token_secret, "S2");

        let request = &transport.requests()[0];
        assert_eq!(request.url, "https://api.example.com/oauth/access_token");
        assert_eq!(request.header("oauth_verifier"), Some("V1"));
        assert_eq!(
            request.form,
            Some(vec![("oauth_verifier".to_owned(), "V1".to_owned())])
        );
        assert!(
            request
                .header("Authorization")
                .unwrap()
                .contains(r#"oauth_token="T1""#)
        );
    }

    #[test]
    fn test_access_token_signed_with_request_token_secret() {
        let transport = Arc::new(
            MockTransport::new().with_response(200, "oauth_token=T2&oauth_token_secret=S2"),
        );
        client(&transport)
            .access_token(&RequestToken::new("T1", "S1"), "V1")
            .unwrap();

        let (params, signature) = signed_parameters(&transport.requests()[0]);
        let engine = SignatureEngine::new("https://api.example.com");
        let sign = |token_secret: &str| {
            engine.sign("POST", &params, "oauth/access_token", token_secret, "cs")
        };

        assert_eq!(sign("S1"), signature);
        assert_ne!(sign(""), signature);
        assert_ne!(sign("T1"), signature);
        assert!(params.iter().all(|(k, _)| k != "oauth_verifier"));
    }

    #[test]
    fn test_access_token_rejects_invalid_request_token() {
        let transport = Arc::new(MockTransport::new());
        let err = client(&transport)
            .access_token(&RequestToken::default(), "V1")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidToken);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_access_token_without_token_is_invalid_token_error() {
        let transport = Arc::new(MockTransport::new().with_response(200, ""));
        let err = client(&transport)
            .access_token(&RequestToken::new("T1", "S1"), "V1")
            .unwrap_err();

        assert!(matches!(
            err,
            OAuthError::InvalidToken {
                step: Step::AccessToken
            }
        ));
    }

    #[test]
    fn test_verify_credentials_returns_raw_body_and_signs_query() {
        let profile = "{\"id\": 7,\n \"screen_name\": \"someone\"}";
        let transport = Arc::new(MockTransport::new().with_response(200, profile));
        let body = client(&transport).verify_credentials("T2", "S2").unwrap();

        assert_eq!(body, profile);

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::Get);
        let (url, query) = request.url.split_once('?').unwrap();
        assert_eq!(
            url,
            "https://api.example.com/1.1/account/verify_credentials.json"
        );
        assert!(query.starts_with("oauth_consumer_key=ck&oauth_nonce="));
        assert!(query.contains("&oauth_token=T2&"));
        assert!(query.contains("&include_email=true&oauth_signature="));
    }

    #[test]
    fn test_verify_credentials_signed_with_access_token_secret() {
        let transport = Arc::new(MockTransport::new().with_response(200, "{}"));
        client(&transport).verify_credentials("T2", "S2").unwrap();

        let (params, signature) = signed_parameters(&transport.requests()[0]);
        let engine = SignatureEngine::new("https://api.example.com");
        let sign = |token_secret: &str| {
            engine.sign(
                "GET",
                &params,
                "1.1/account/verify_credentials.json",
                token_secret,
                "cs",
            )
        };

        assert_eq!(sign("S2"), signature);
        assert_ne!(sign(""), signature);
        assert!(
            params
                .iter()
                .any(|(k, v)| k == "include_email" && v == "true")
        );
    }

    #[test]
    fn test_verify_credentials_fresh_nonce_per_request() {
        let transport = Arc::new(
            MockTransport::new()
                .with_response(200, "{}")
                .with_response(200, "{}"),
        );
        let client = client(&transport);
        client.verify_credentials("T2", "S2").unwrap();
        client.verify_credentials("T2", "S2").unwrap();

        let requests = transport.requests();
        assert_ne!(requests[0].url, requests[1].url);
    }

    #[test]
    fn test_verify_credentials_rejects_empty_token() {
        let transport = Arc::new(MockTransport::new());
        let err = client(&transport).verify_credentials("", "S2").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidToken);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_default_endpoints() {
        let endpoints = ProviderEndpoints::default();
        assert_eq!(endpoints.base_url, "https://api.twitter.com");
        assert_eq!(
            endpoints.verify_credentials_path,
            "1.1/account/verify_credentials.json"
        );
    }
}
