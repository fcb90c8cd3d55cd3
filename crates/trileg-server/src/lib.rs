//! OAuth callback server for trileg.
//!
//! Serves the single route the provider redirects back to. A request without
//! `oauth_token` starts a flow and redirects the browser to the provider; the
//! provider's callback finishes it and renders the user's profile.
//!
//! # Quick Start
//!
//! ```ignore
//! use trileg_config::Config;
//! use trileg_server::{run_server, server_config_from_config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load(None, None).unwrap();
//!     run_server(server_config_from_config(&config).unwrap()).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum router (trileg-server)
//!                        │
//!                        ├─► GET / ──► spawn_blocking ──► FlowOrchestrator
//!                        │
//!                        └─► PendingTokens (request token → secret)
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod pending;
mod state;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use trileg_config::{Config, ConfigError};
use trileg_oauth::{Credentials, FlowOrchestrator, ProviderEndpoints, TokenExchangeClient};

pub use error::ServerError;
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Consumer credentials; the callback URL should point at this server.
    pub credentials: Credentials,
    /// Provider endpoint layout.
    pub endpoints: ProviderEndpoints,
    /// Per-request timeout for provider calls.
    pub timeout: Duration,
}

/// Run the server.
///
/// # Errors
///
/// Returns an error if the address is invalid or the listener fails.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = TokenExchangeClient::new(config.credentials, config.endpoints, config.timeout);
    let state = Arc::new(AppState::new(FlowOrchestrator::new(client)));
    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting callback server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Build OAuth credentials and endpoints from loaded configuration.
///
/// `callback_url` overrides the configured callback when set.
///
/// # Errors
///
/// Returns `ConfigError::Validation` if credentials are missing or invalid.
pub fn oauth_settings_from_config(
    config: &Config,
    callback_url: Option<&str>,
) -> Result<(Credentials, ProviderEndpoints), ConfigError> {
    let section = config.require_credentials()?;
    let credentials = Credentials::new(
        &section.consumer_key,
        &section.consumer_secret,
        callback_url.unwrap_or(&section.callback_url),
    );

    let provider = &config.provider;
    let endpoints = ProviderEndpoints {
        base_url: provider.base_url.clone(),
        request_token_path: provider.request_token_path.clone(),
        authorize_path: provider.authorize_path.clone(),
        access_token_path: provider.access_token_path.clone(),
        verify_credentials_path: provider.verify_credentials_path.clone(),
    };

    Ok((credentials, endpoints))
}

/// Create server configuration from trileg config.
///
/// # Errors
///
/// Returns `ConfigError::Validation` if credentials are missing or invalid.
pub fn server_config_from_config(config: &Config) -> Result<ServerConfig, ConfigError> {
    let (credentials, endpoints) = oauth_settings_from_config(config, None)?;
    Ok(ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        credentials,
        endpoints,
        timeout: config.provider.timeout(),
    })
}
