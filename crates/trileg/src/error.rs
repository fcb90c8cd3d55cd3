//! CLI error types.

use trileg_config::ConfigError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// The OAuth flow halted with a user-facing message.
    #[error("{0}")]
    Flow(String),

    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    Validation(String),
}
