use std::fmt;

use crate::error::{AuthProblem, ExtractError, Result};

/// Environment variable consulted before the auth store.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const KEY_PREFIX: &str = "AIza";

/// A Gemini API key that passed the shape check
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Validate a configured key, distinguishing "missing" from "malformed".
    pub fn resolve(raw: Option<&str>) -> Result<Self> {
        let key = match raw.map(str::trim) {
            None | Some("") => {
                return Err(ExtractError::auth(
                    AuthProblem::Missing,
                    format!(
                        "no API key configured; set {API_KEY_ENV} or run: credito auth paste-api-key"
                    ),
                ));
            }
            Some(k) => k,
        };

        if !key.starts_with(KEY_PREFIX) || key.chars().any(char::is_whitespace) {
            return Err(ExtractError::auth(
                AuthProblem::Malformed,
                format!(
                    "the configured API key does not look like a Gemini key (expected prefix {KEY_PREFIX}); \
check {API_KEY_ENV} or re-run: credito auth paste-api-key"
                ),
            ));
        }

        Ok(ApiKey(key.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({}…)", &self.0[..KEY_PREFIX.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key() {
        for raw in [None, Some(""), Some("   ")] {
            match ApiKey::resolve(raw) {
                Err(ExtractError::Auth { problem, message }) => {
                    assert_eq!(problem, AuthProblem::Missing);
                    assert!(message.contains(API_KEY_ENV));
                }
                other => panic!("expected missing-key error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_malformed_key() {
        for raw in ["sk-ant-123", "AIza abc", "aiza123"] {
            match ApiKey::resolve(Some(raw)) {
                Err(ExtractError::Auth { problem, .. }) => assert_eq!(problem, AuthProblem::Malformed),
                other => panic!("expected malformed-key error for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_missing_and_malformed_messages_differ() {
        let a = ApiKey::resolve(None).unwrap_err().to_string();
        let b = ApiKey::resolve(Some("nope")).unwrap_err().to_string();
        assert_ne!(a, b);
    }

    #[test]
    fn test_valid_key_is_trimmed_and_redacted() {
        let key = ApiKey::resolve(Some("  AIzaSyExample123  ")).unwrap();
        assert_eq!(key.expose(), "AIzaSyExample123");
        assert!(!format!("{key:?}").contains("Example"));
    }
}
