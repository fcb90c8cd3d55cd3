//! Configuration management for trileg.
//!
//! Parses `trileg.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//! - `$$` - a literal `$` in values that also contain a reference
//!
//! Expanded fields:
//! - `server.host`
//! - `provider.base_url`
//! - `credentials.consumer_key`
//! - `credentials.consumer_secret`
//! - `credentials.callback_url`

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override provider base URL.
    pub base_url: Option<String>,
    /// Override HTTP timeout.
    pub timeout_secs: Option<u64>,
    /// Override consumer key.
    pub consumer_key: Option<String>,
    /// Override consumer secret.
    pub consumer_secret: Option<String>,
    /// Override callback URL.
    pub callback_url: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "trileg.toml";

/// Default for `provider.timeout_secs`.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Upper bound for `provider.timeout_secs`.
const MAX_TIMEOUT_SECS: u64 = 300;

/// Callback value selecting the out-of-band (PIN) flow.
pub const OOB_CALLBACK: &str = "oob";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Callback server configuration.
    pub server: ServerConfig,
    /// Provider endpoints and HTTP settings.
    pub provider: ProviderConfig,
    /// Consumer credentials (optional section).
    pub credentials: Option<CredentialsConfig>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Callback server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7980,
        }
    }
}

/// Provider endpoint configuration.
///
/// Paths are relative to `base_url`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider API base URL.
    pub base_url: String,
    /// Temporary credentials endpoint.
    pub request_token_path: String,
    /// User-facing authorization page.
    pub authorize_path: String,
    /// Access token endpoint.
    pub access_token_path: String,
    /// Profile endpoint.
    pub verify_credentials_path: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twitter.com".to_owned(),
            request_token_path: "oauth/request_token".to_owned(),
            authorize_path: "oauth/authorize".to_owned(),
            access_token_path: "oauth/access_token".to_owned(),
            verify_credentials_path: "1.1/account/verify_credentials.json".to_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ProviderConfig {
    /// Per-request HTTP timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Consumer credentials.
#[derive(Deserialize)]
pub struct CredentialsConfig {
    /// OAuth consumer key.
    pub consumer_key: String,
    /// OAuth consumer secret.
    pub consumer_secret: String,
    /// Callback URL registered with the provider, or `oob`.
    #[serde(default = "default_callback_url")]
    pub callback_url: String,
}

impl CredentialsConfig {
    /// Validate that all required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any field is empty or has invalid format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.consumer_key, "credentials.consumer_key")?;
        require_non_empty(&self.consumer_secret, "credentials.consumer_secret")?;
        require_non_empty(&self.callback_url, "credentials.callback_url")?;
        if self.callback_url != OOB_CALLBACK {
            require_http_url(&self.callback_url, "credentials.callback_url")?;
        }
        Ok(())
    }

    /// Whether the out-of-band (PIN) flow is configured.
    #[must_use]
    pub fn is_oob(&self) -> bool {
        self.callback_url == OOB_CALLBACK
    }
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("callback_url", &self.callback_url)
            .finish()
    }
}

fn default_callback_url() -> String {
    "http://127.0.0.1:7980/".to_owned()
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`credentials.consumer_secret`").
        field: String,
        /// Error message (e.g., "${`TRILEG_CONSUMER_SECRET`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `trileg.toml` in current directory and parents,
    /// falling back to defaults.
    ///
    /// CLI settings are applied after loading and take precedence over
    /// config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    ///
    /// Credential overrides create the `[credentials]` section if missing.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(base_url) = &settings.base_url {
            self.provider.base_url.clone_from(base_url);
        }
        if let Some(timeout_secs) = settings.timeout_secs {
            self.provider.timeout_secs = timeout_secs;
        }

        let has_credential_override = settings.consumer_key.is_some()
            || settings.consumer_secret.is_some()
            || settings.callback_url.is_some();
        if !has_credential_override {
            return;
        }
        let credentials = self.credentials.get_or_insert_with(|| CredentialsConfig {
            consumer_key: String::new(),
            consumer_secret: String::new(),
            callback_url: default_callback_url(),
        });
        if let Some(consumer_key) = &settings.consumer_key {
            credentials.consumer_key.clone_from(consumer_key);
        }
        if let Some(consumer_secret) = &settings.consumer_secret {
            credentials.consumer_secret.clone_from(consumer_secret);
        }
        if let Some(callback_url) = &settings.callback_url {
            credentials.callback_url.clone_from(callback_url);
        }
    }

    /// Get validated credentials.
    ///
    /// Use this instead of accessing the `credentials` field directly when
    /// the command needs to talk to the provider.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or invalid.
    pub fn require_credentials(&self) -> Result<&CredentialsConfig, ConfigError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ConfigError::Validation("[credentials] section required in config".into())
        })?;
        credentials.validate()?;
        Ok(credentials)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Credentials are not validated here; see [`Config::require_credentials`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_provider()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 lets the OS pick a port the provider cannot know about
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_provider(&self) -> Result<(), ConfigError> {
        let provider = &self.provider;
        require_non_empty(&provider.base_url, "provider.base_url")?;
        require_http_url(&provider.base_url, "provider.base_url")?;
        require_non_empty(&provider.request_token_path, "provider.request_token_path")?;
        require_non_empty(&provider.authorize_path, "provider.authorize_path")?;
        require_non_empty(&provider.access_token_path, "provider.access_token_path")?;
        require_non_empty(
            &provider.verify_credentials_path,
            "provider.verify_credentials_path",
        )?;

        if provider.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "provider.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        if provider.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Validation(format!(
                "provider.timeout_secs cannot exceed {MAX_TIMEOUT_SECS}"
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        expand::expand_in_place(&mut self.server.host, "server.host")?;
        expand::expand_in_place(&mut self.provider.base_url, "provider.base_url")?;

        if let Some(ref mut credentials) = self.credentials {
            expand::expand_in_place(&mut credentials.consumer_key, "credentials.consumer_key")?;
            expand::expand_in_place(
                &mut credentials.consumer_secret,
                "credentials.consumer_secret",
            )?;
            expand::expand_in_place(&mut credentials.callback_url, "credentials.callback_url")?;
        }

        Ok(())
    }
}
