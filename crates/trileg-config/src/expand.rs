//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Error returned when environment variable lookup fails.
struct LookupError {
    var_name: String,
}

/// Expand `${VAR}` and `${VAR:-default}` references in a string.
///
/// `${VAR}` errors if VAR is unset. Values without `${` are returned
/// unchanged. Once a value contains `${`, bare `$name` is expanded too; write
/// a literal `$` as `$$`.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        std::env::var(var).map(Some).map_err(|_| LookupError {
            var_name: var.to_owned(),
        })
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}} not set", e.cause.var_name),
    })
}

/// Expand in place.
pub(crate) fn expand_in_place(value: &mut String, field: &str) -> Result<(), ConfigError> {
    *value = expand_env(value, field)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_consumer_secret() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("TRILEG_TEST_SECRET", "s3cr3t");
        }
        let result = expand_env("${TRILEG_TEST_SECRET}", "credentials.consumer_secret").unwrap();
        assert_eq!(result, "s3cr3t");
        unsafe {
            std::env::remove_var("TRILEG_TEST_SECRET");
        }
    }

    #[test]
    fn test_expand_default_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("TRILEG_TEST_UNSET_PORT");
        }
        let result = expand_env(
            "http://127.0.0.1:${TRILEG_TEST_UNSET_PORT:-7980}/",
            "credentials.callback_url",
        )
        .unwrap();
        assert_eq!(result, "http://127.0.0.1:7980/");
    }

    #[test]
    fn test_expand_missing_var_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("TRILEG_TEST_MISSING");
        }
        let err = expand_env("${TRILEG_TEST_MISSING}", "credentials.consumer_key").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("TRILEG_TEST_MISSING"));
        assert!(err.to_string().contains("credentials.consumer_key"));
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        let result = expand_env("pa$$word", "credentials.consumer_secret").unwrap();
        assert_eq!(result, "pa$$word");
    }

    #[test]
    fn test_escaped_dollar_next_to_reference() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("TRILEG_TEST_PREFIX", "p");
        }
        let result =
            expand_env("${TRILEG_TEST_PREFIX}ab$$cd", "credentials.consumer_secret").unwrap();
        assert_eq!(result, "pab$cd");
        unsafe {
            std::env::remove_var("TRILEG_TEST_PREFIX");
        }
    }

    #[test]
    fn test_expand_in_place() {
        let mut value = "literal".to_owned();
        expand_in_place(&mut value, "server.host").unwrap();
        assert_eq!(value, "literal");
    }
}
