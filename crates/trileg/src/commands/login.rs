//! `trileg login` command implementation.
//!
//! Runs the out-of-band flow: the provider shows the user a PIN instead of
//! redirecting to a callback URL.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use trileg_config::{CliSettings, Config, OOB_CALLBACK};
use trileg_oauth::{FlowOrchestrator, FlowState, TokenExchangeClient};
use trileg_server::oauth_settings_from_config;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the login command.
#[derive(Args)]
pub(crate) struct LoginArgs {
    /// Path to configuration file (default: auto-discover trileg.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Provider API base URL (overrides config).
    #[arg(short = 'u', long)]
    base_url: Option<String>,

    /// OAuth consumer key (overrides config).
    #[arg(long, env = "TRILEG_CONSUMER_KEY")]
    consumer_key: Option<String>,

    /// OAuth consumer secret (overrides config).
    #[arg(long, env = "TRILEG_CONSUMER_SECRET", hide_env_values = true)]
    consumer_secret: Option<String>,

    /// HTTP timeout in seconds (overrides config).
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl LoginArgs {
    /// Execute the login command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or any flow step fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            base_url: self.base_url,
            timeout_secs: self.timeout,
            consumer_key: self.consumer_key,
            consumer_secret: self.consumer_secret,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        tracing::debug!(path = ?config.config_path, "Configuration loaded");

        let (credentials, endpoints) = oauth_settings_from_config(&config, Some(OOB_CALLBACK))?;
        let flow = FlowOrchestrator::new(TokenExchangeClient::new(
            credentials,
            endpoints,
            config.provider.timeout(),
        ));

        // Step 1: Get request token
        output.info("Step 1: Requesting temporary credentials...");
        let (request_token, authorize_url) = match flow.advance(FlowState::Start) {
            FlowState::RequestTokenObtained {
                request_token,
                authorize_url,
            } => (request_token, authorize_url),
            other => return Err(flow_error(other)),
        };
        output.success("Temporary token received");

        // Step 2: User authorization
        output.separator();
        output.highlight("Step 2: Authorization Required");
        output.separator();
        output.info("\nPlease open this URL in your browser:");
        output.highlight(&format!("\n{authorize_url}\n"));

        output.prompt("Enter the PIN: ")?;
        let mut verifier = String::new();
        io::stdin().read_line(&mut verifier)?;
        let verifier = verifier.trim();
        if verifier.is_empty() {
            return Err(CliError::Validation("PIN cannot be empty".to_owned()));
        }

        // Step 3: Exchange for access token and fetch the profile
        output.info("\nStep 3: Exchanging PIN for access token...");
        let state = flow.run(FlowState::AwaitingUserAuthorization {
            request_token,
            verifier: verifier.to_owned(),
        });
        let FlowState::ProfileFetched {
            access_token,
            profile,
        } = state
        else {
            return Err(flow_error(state));
        };

        output.separator();
        output.success("OAuth Authorization Successful!");
        output.separator();

        let mut stdout = io::stdout().lock();
        writeln!(stdout, r#"access_token = "{}""#, access_token.oauth_token)?;
        writeln!(
            stdout,
            r#"access_secret = "{}""#,
            access_token.oauth_token_secret
        )?;
        writeln!(stdout)?;
        writeln!(stdout, "{}", pretty_json(&profile))?;

        Ok(())
    }
}

/// Convert a state the flow stopped in into an error.
fn flow_error(state: FlowState) -> CliError {
    match state {
        FlowState::Failed { message } => CliError::Flow(message),
        other => CliError::Flow(format!("OAuth flow stopped unexpectedly: {other:?}")),
    }
}

/// Indent JSON for display, or return it unchanged when it is not JSON.
fn pretty_json(raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|_| raw.to_owned())
}
