//! Error types for the OAuth flow.

use std::fmt;

/// Protocol step that produced a token or an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Temporary credentials request.
    RequestToken,
    /// Verifier exchange for access credentials.
    AccessToken,
    /// Profile fetch with access credentials.
    VerifyCredentials,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RequestToken => "request token",
            Self::AccessToken => "access token",
            Self::VerifyCredentials => "verify credentials",
        };
        f.write_str(name)
    }
}

/// Coarse classification of [`OAuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Provider returned no usable token.
    InvalidToken,
    /// Network error, timeout or non-2xx response.
    TransportFailure,
    /// Response body could not be read into the expected shape.
    MalformedResponse,
}

/// Error from OAuth flow operations.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Provider response carried no `oauth_token`.
    #[error("{step} retrieval failed: provider returned no token")]
    InvalidToken {
        /// Step whose response was rejected.
        step: Step,
    },

    /// HTTP request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// HTTP request exceeded the configured timeout.
    #[error("HTTP request timed out")]
    Timeout,

    /// Provider answered with a non-2xx status.
    #[error("HTTP error: {status} - {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// Response body could not be read.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl OAuthError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidToken { .. } => ErrorKind::InvalidToken,
            Self::Transport(_) | Self::Timeout | Self::HttpStatus { .. } => {
                ErrorKind::TransportFailure
            }
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }
}

impl From<ureq::Error> for OAuthError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => Self::Timeout,
            ureq::Error::StatusCode(status) => Self::HttpStatus {
                status,
                body: String::new(),
            },
            other => Self::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            OAuthError::InvalidToken {
                step: Step::RequestToken
            }
            .kind(),
            ErrorKind::InvalidToken
        );
        assert_eq!(OAuthError::Timeout.kind(), ErrorKind::TransportFailure);
        assert_eq!(
            OAuthError::HttpStatus {
                status: 401,
                body: String::new()
            }
            .kind(),
            ErrorKind::TransportFailure
        );
        assert_eq!(
            OAuthError::MalformedResponse("x".to_owned()).kind(),
            ErrorKind::MalformedResponse
        );
    }

    #[test]
    fn test_invalid_token_message_names_step() {
        let err = OAuthError::InvalidToken {
            step: Step::AccessToken,
        };
        assert_eq!(
            err.to_string(),
            "access token retrieval failed: provider returned no token"
        );
    }
}
