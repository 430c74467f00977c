//! Login Value Object
//!
//! The name a user registers and signs in with. Compared exactly after
//! NFKC normalization and trimming; case is significant.

use std::fmt;

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Maximum length for a login (in characters)
pub const LOGIN_MAX_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("login cannot be empty")]
    Empty,

    #[error("login must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("login contains control characters")]
    ControlCharacter,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Login(String);

impl Login {
    pub fn new(raw: &str) -> Result<Self, LoginError> {
        let normalized: String = raw.nfkc().collect();
        let trimmed = normalized.trim();

        if trimmed.is_empty() {
            return Err(LoginError::Empty);
        }
        let actual = trimmed.chars().count();
        if actual > LOGIN_MAX_LENGTH {
            return Err(LoginError::TooLong {
                max: LOGIN_MAX_LENGTH,
                actual,
            });
        }
        if trimmed.chars().any(char::is_control) {
            return Err(LoginError::ControlCharacter);
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Rebuild from a stored value without re-validating.
    pub fn from_db(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
