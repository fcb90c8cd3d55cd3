//! `trileg serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use trileg_config::{CliSettings, Config};
use trileg_server::{run_server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover trileg.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Provider API base URL (overrides config).
    #[arg(short = 'u', long)]
    base_url: Option<String>,

    /// OAuth consumer key (overrides config).
    #[arg(long, env = "TRILEG_CONSUMER_KEY")]
    consumer_key: Option<String>,

    /// OAuth consumer secret (overrides config).
    #[arg(long, env = "TRILEG_CONSUMER_SECRET", hide_env_values = true)]
    consumer_secret: Option<String>,

    /// Callback URL registered with the provider (overrides config).
    #[arg(long)]
    callback_url: Option<String>,

    /// HTTP timeout in seconds (overrides config).
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable verbose output (log each flow step).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            base_url: self.base_url,
            consumer_key: self.consumer_key,
            consumer_secret: self.consumer_secret,
            callback_url: self.callback_url,
            timeout_secs: self.timeout,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        tracing::debug!(path = ?config.config_path, "Configuration loaded");

        let credentials = config.require_credentials()?;
        if credentials.is_oob() {
            return Err(CliError::Validation(
                "callback_url is \"oob\"; use `trileg login` for the PIN flow".to_owned(),
            ));
        }

        output.info(&format!(
            "Starting callback server on http://{}:{}/",
            config.server.host, config.server.port
        ));
        output.info(&format!("Provider: {}", config.provider.base_url));
        output.info(&format!("Callback URL: {}", credentials.callback_url));

        let server_config = server_config_from_config(&config)?;
        run_server(server_config)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }
}
