//! Three-legged flow as an explicit state machine.
//!
//! The flow spans two inbound requests. The first has no `oauth_token` and
//! ends with a redirect to the provider; the second is the provider's
//! callback carrying `oauth_token` and `oauth_verifier`. Between the two the
//! only state is the request token, carried in the URL, and its secret,
//! which the caller's session layer must keep. Without the secret the
//! access-token request is signed with an empty token secret.
//!
//! ```text
//! Start ──► RequestTokenObtained ──(redirect, user approves)──►
//!     AwaitingUserAuthorization ──► AccessTokenObtained ──► ProfileFetched
//!
//! any state ──error──► Failed
//! ```

use crate::client::TokenExchangeClient;
use crate::error::{OAuthError, Step};
use crate::token::{AccessToken, RequestToken};

/// Message for a request-token response without a token.
pub const REQUEST_TOKEN_FAILED: &str = "Request token retrieval failed.";

/// Message for a callback where the user declined authorization.
pub const AUTHORIZATION_DENIED: &str = "Authorization was denied.";

/// Query parameters of an inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub oauth_token: Option<String>,
    pub oauth_verifier: Option<String>,
    /// Set by the provider when the user cancels authorization.
    pub denied: Option<String>,
}

impl CallbackParams {
    /// Build from decoded `(name, value)` pairs; unknown names are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "oauth_token" => params.oauth_token = Some(value.to_owned()),
                "oauth_verifier" => params.oauth_verifier = Some(value.to_owned()),
                "denied" => params.denied = Some(value.to_owned()),
                _ => {}
            }
        }
        params
    }
}

/// Flow state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    /// No token yet.
    Start,
    /// Temporary credentials issued; the user must be sent to `authorize_url`.
    RequestTokenObtained {
        request_token: RequestToken,
        authorize_url: String,
    },
    /// The user returned through the callback with a verifier.
    AwaitingUserAuthorization {
        request_token: RequestToken,
        verifier: String,
    },
    /// Access credentials issued.
    AccessTokenObtained { access_token: AccessToken },
    /// Profile fetched; terminal.
    ProfileFetched {
        access_token: AccessToken,
        profile: String,
    },
    /// Terminal failure with a human-readable message.
    Failed { message: String },
}

impl FlowState {
    /// Whether `advance` would leave this state unchanged.
    ///
    /// `RequestTokenObtained` is a suspension point: control leaves the
    /// process until the callback arrives.
    pub fn is_suspended(&self) -> bool {
        matches!(
            self,
            Self::RequestTokenObtained { .. } | Self::ProfileFetched { .. } | Self::Failed { .. }
        )
    }

    fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// What the UI collaborator should do after one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Redirect the user agent to `authorize_url`. The caller keeps
    /// `request_token.oauth_token_secret` for the callback.
    Redirect {
        authorize_url: String,
        request_token: RequestToken,
    },
    /// Flow completed; `profile` is the provider's raw JSON.
    Profile {
        access_token: AccessToken,
        profile: String,
    },
    /// Flow halted.
    Failed { message: String },
}

/// Drives the flow over a [`TokenExchangeClient`].
///
/// Holds no per-flow state; one orchestrator can serve concurrent flows.
pub struct FlowOrchestrator {
    client: TokenExchangeClient,
}

impl FlowOrchestrator {
    pub fn new(client: TokenExchangeClient) -> Self {
        Self { client }
    }

    /// Handle one inbound request.
    ///
    /// # Arguments
    /// * `params` - Query parameters of the inbound request
    /// * `request_token_secret` - Secret kept by the session layer for
    ///   `params.oauth_token`, if any
    pub fn handle(&self, params: &CallbackParams, request_token_secret: Option<&str>) -> FlowOutcome {
        if params.denied.is_some() {
            tracing::info!("User denied authorization");
            return FlowOutcome::Failed {
                message: AUTHORIZATION_DENIED.to_owned(),
            };
        }

        let initial = match (&params.oauth_token, &params.oauth_verifier) {
            (None, _) => FlowState::Start,
            (Some(_), None) => FlowState::failed("Callback is missing oauth_verifier."),
            (Some(token), Some(verifier)) => FlowState::AwaitingUserAuthorization {
                request_token: RequestToken::new(token, request_token_secret.unwrap_or_default()),
                verifier: verifier.clone(),
            },
        };

        match self.run(initial) {
            FlowState::RequestTokenObtained {
                request_token,
                authorize_url,
            } => FlowOutcome::Redirect {
                authorize_url,
                request_token,
            },
            FlowState::ProfileFetched {
                access_token,
                profile,
            } => FlowOutcome::Profile {
                access_token,
                profile,
            },
            FlowState::Failed { message } => FlowOutcome::Failed { message },
            other => FlowOutcome::Failed {
                message: format!("Flow stopped in unexpected state: {other:?}"),
            },
        }
    }

    /// Advance until the flow suspends or terminates.
    pub fn run(&self, mut state: FlowState) -> FlowState {
        while !state.is_suspended() {
            state = self.advance(state);
        }
        state
    }

    /// Perform a single transition.
    pub fn advance(&self, state: FlowState) -> FlowState {
        match state {
            FlowState::Start => match self.client.request_token() {
                Ok(request_token) if request_token.is_valid() => {
                    let authorize_url = self.client.authorize_url(&request_token);
                    FlowState::RequestTokenObtained {
                        request_token,
                        authorize_url,
                    }
                }
                Ok(_) => FlowState::failed(REQUEST_TOKEN_FAILED),
                Err(e) => fail(Step::RequestToken, &e),
            },
            FlowState::AwaitingUserAuthorization {
                request_token,
                verifier,
            } => match self.client.access_token(&request_token, &verifier) {
                Ok(access_token) => FlowState::AccessTokenObtained { access_token },
                Err(e) => fail(Step::AccessToken, &e),
            },
            FlowState::AccessTokenObtained { access_token } => match self
                .client
                .verify_credentials(&access_token.oauth_token, &access_token.oauth_token_secret)
            {
                Ok(profile) => FlowState::ProfileFetched {
                    access_token,
                    profile,
                },
                Err(e) => fail(Step::VerifyCredentials, &e),
            },
            suspended => suspended,
        }
    }
}

/// Transition to `Failed` with a message naming the step.
fn fail(step: Step, err: &OAuthError) -> FlowState {
    tracing::warn!(%step, error = %err, "OAuth flow failed");
    FlowState::failed(format!("{} failed: {err}", capitalize(&step.to_string())))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
