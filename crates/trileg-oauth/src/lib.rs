//! Three-legged OAuth 1.0a with HMAC-SHA1 request signing.
//!
//! # Architecture
//!
//! ```text
//! FlowOrchestrator ──► TokenExchangeClient ──► HttpTransport (ureq / mock)
//!                              │
//!                              └─► AuthParameterBuilder ──► SignatureEngine
//! ```
//!
//! - [`SignatureEngine`] builds the base string and the HMAC-SHA1 signature
//! - [`AuthParameterBuilder`] assembles per-step OAuth parameters and
//!   serializes them into an `Authorization` header or query string
//! - [`TokenExchangeClient`] performs the request-token, access-token and
//!   verify-credentials calls
//! - [`FlowOrchestrator`] runs the flow as an explicit state machine
//!
//! The core holds no shared mutable state: one orchestrator may serve any
//! number of concurrent flows.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use trileg_oauth::{
//!     CallbackParams, Credentials, FlowOrchestrator, FlowOutcome, ProviderEndpoints,
//!     TokenExchangeClient,
//! };
//!
//! let client = TokenExchangeClient::new(
//!     Credentials::new("key", "secret", "http://127.0.0.1:7980/"),
//!     ProviderEndpoints::default(),
//!     Duration::from_secs(30),
//! );
//! let flow = FlowOrchestrator::new(client);
//! match flow.handle(&CallbackParams::default(), None) {
//!     FlowOutcome::Redirect { authorize_url, .. } => { /* send the user there */ }
//!     FlowOutcome::Profile { profile, .. } => { /* render */ }
//!     FlowOutcome::Failed { message } => { /* show message */ }
//! }
//! ```

mod client;
mod error;
mod flow;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod params;
mod signature;
mod token;
mod transport;

pub use client::{ProviderEndpoints, TokenExchangeClient};
pub use error::{ErrorKind, OAuthError, Step};
pub use flow::{
    AUTHORIZATION_DENIED, CallbackParams, FlowOrchestrator, FlowOutcome, FlowState,
    REQUEST_TOKEN_FAILED,
};
#[cfg(feature = "mock")]
pub use mock::MockTransport;
pub use params::{AuthParameterBuilder, AuthParameters};
pub use signature::{SignatureEngine, canonical_parameters, percent_encode, signing_key};
pub use token::{AccessToken, Credentials, RequestToken};
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, UreqTransport,
};
