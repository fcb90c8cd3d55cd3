//! Callback endpoint.
//!
//! `GET /` both starts a flow and receives the provider's redirect back.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use trileg_oauth::{CallbackParams, FlowOutcome};

use crate::error::ServerError;
use crate::state::AppState;

/// Handle GET /.
///
/// Flow steps block on provider I/O, so they run on the blocking pool.
pub(crate) async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, ServerError> {
    let params = CallbackParams::from_pairs(&query);

    if let Some(token) = &params.denied {
        state.pending.remove(token);
    }

    let secret = match (&params.oauth_token, &params.oauth_verifier) {
        (Some(token), Some(_)) => {
            let secret = state.pending.take(token);
            if secret.is_none() {
                tracing::warn!("No pending secret for callback token, signing without it");
            }
            secret
        }
        _ => None,
    };

    let orchestrator = Arc::clone(&state.orchestrator);
    let outcome =
        tokio::task::spawn_blocking(move || orchestrator.handle(&params, secret.as_deref()))
            .await?;

    match outcome {
        FlowOutcome::Redirect {
            authorize_url,
            request_token,
        } => {
            state.pending.insert(
                &request_token.oauth_token,
                &request_token.oauth_token_secret,
            );
            tracing::info!("Redirecting user to provider for authorization");
            Ok(Redirect::to(&authorize_url).into_response())
        }
        FlowOutcome::Profile { profile, .. } => {
            tracing::info!("OAuth flow completed");
            Ok(profile_response(&profile))
        }
        FlowOutcome::Failed { message } => Err(ServerError::Flow(message)),
    }
}

/// Render the profile as indented JSON, or as-is when it is not JSON.
fn profile_response(raw: &str) -> Response {
    let pretty = serde_json::from_str::<serde_json::Value>(raw)
        .and_then(|value| serde_json::to_string_pretty(&value));
    match pretty {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(_) => raw.to_owned().into_response(),
    }
}
