//! Login Value Object
//!
//! The unique handle an account registers and signs in with.
//!
//! ## Invariants
//! - 3 to 10 characters
//! - ASCII letters, digits, `_`, `-` only

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Minimum login length (in characters)
pub const LOGIN_MIN_LENGTH: usize = 3;

/// Maximum login length (in characters)
pub const LOGIN_MAX_LENGTH: usize = 10;

/// Error returned when login validation fails
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Login cannot be empty")]
    Empty,

    #[error("Login is too short ({length} chars, minimum {min})")]
    TooShort { length: usize, min: usize },

    #[error("Login is too long ({length} chars, maximum {max})")]
    TooLong { length: usize, max: usize },

    #[error("Invalid character '{char}'. Only a-z, A-Z, 0-9, _, - are allowed")]
    InvalidCharacter { char: char },
}

/// Validated login handle
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Login(String);

impl Login {
    /// Create a new Login from raw input
    pub fn new(input: impl AsRef<str>) -> Result<Self, LoginError> {
        let trimmed = input.as_ref().trim();

        if trimmed.is_empty() {
            return Err(LoginError::Empty);
        }

        let length = trimmed.chars().count();
        if length < LOGIN_MIN_LENGTH {
            return Err(LoginError::TooShort {
                length,
                min: LOGIN_MIN_LENGTH,
            });
        }
        if length > LOGIN_MAX_LENGTH {
            return Err(LoginError::TooLong {
                length,
                max: LOGIN_MAX_LENGTH,
            });
        }

        if let Some(ch) = trimmed.chars().find(|c| !Self::is_valid_char(*c)) {
            return Err(LoginError::InvalidCharacter { char: ch });
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(login: impl Into<String>) -> Self {
        Self(login.into())
    }

    /// Get the login as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    fn is_valid_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_' || c == '-'
    }
}

impl fmt::Debug for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Login").field(&self.0).finish()
    }
}

impl fmt::Display for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Login {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Login {
    type Error = LoginError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Login> for String {
    fn from(login: Login) -> Self {
        login.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_logins() {
        assert!(Login::new("abc").is_ok());
        assert!(Login::new("alice_99").is_ok());
        assert!(Login::new("a-b-c").is_ok());
        assert!(Login::new("ABCDEFGHIJ").is_ok());
    }

    #[test]
    fn test_trims_whitespace() {
        let login = Login::new("  alice  ").unwrap();
        assert_eq!(login.as_str(), "alice");
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(
            Login::new("ab"),
            Err(LoginError::TooShort { length: 2, min: 3 })
        ));
    }

    #[test]
    fn test_too_long() {
        assert!(matches!(
            Login::new("abcdefghijk"),
            Err(LoginError::TooLong { .. })
        ));
    }

    #[test]
    fn test_empty() {
        assert!(matches!(Login::new(""), Err(LoginError::Empty)));
        assert!(matches!(Login::new("   "), Err(LoginError::Empty)));
    }

    #[test]
    fn test_invalid_characters() {
        assert!(matches!(
            Login::new("al.ice"),
            Err(LoginError::InvalidCharacter { char: '.' })
        ));
        assert!(matches!(
            Login::new("al ice"),
            Err(LoginError::InvalidCharacter { char: ' ' })
        ));
        assert!(matches!(
            Login::new("日本語です"),
            Err(LoginError::InvalidCharacter { .. })
        ));
    }

    #[test]
    fn test_serde_roundtrip() {
        let login = Login::new("alice").unwrap();
        let json = serde_json::to_string(&login).unwrap();
        assert_eq!(json, "\"alice\"");

        let back: Login = serde_json::from_str(&json).unwrap();
        assert_eq!(back, login);

        let invalid: Result<Login, _> = serde_json::from_str("\"ab\"");
        assert!(invalid.is_err());
    }
}
