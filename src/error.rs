//! Error Taxonomy
//!
//! Every failure the crate can surface to a caller. Coordinate validation
//! failures are deliberately absent: they are reported outcomes
//! (see [`crate::cells::WriteOutcome`]), not errors.

use thiserror::Error;

/// Errors raised by the TM1 client, the cell-write core and the tools.
#[derive(Debug, Error)]
pub enum Tm1Error {
    /// A cube, dimension, element, procedure, chore or view does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// Coordinate arity does not match the cube's dimensionality.
    #[error("coordinate has {actual} element(s) but the cube has {expected} dimension(s)")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Procedure section name outside prolog/metadata/data/epilog.
    #[error("invalid procedure section '{0}', expected one of: prolog, metadata, data, epilog")]
    InvalidSection(String),

    /// The server answered with an error status, or the request never completed.
    #[error("remote call failed (status {status}): {message}")]
    Remote { status: u16, message: String },

    /// The request exceeded the configured timeout.
    #[error("remote call timed out: {0}")]
    Timeout(String),

    /// A caller-supplied argument was missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Connection configuration is incomplete or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Tm1Error {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Tm1Error::NotFound { kind, name: name.into() }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Tm1Error::InvalidArgument(message.into())
    }

    /// True for 404-style failures
    pub fn is_not_found(&self) -> bool {
        matches!(self, Tm1Error::NotFound { .. })
    }
}

impl From<reqwest::Error> for Tm1Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Tm1Error::Timeout(err.to_string());
        }
        Tm1Error::Remote {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Tm1Error {
    fn from(err: serde_json::Error) -> Self {
        Tm1Error::Remote {
            status: 0,
            message: format!("malformed response body: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Tm1Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_object() {
        let err = Tm1Error::not_found("cube", "Sales");
        assert_eq!(err.to_string(), "cube 'Sales' not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_shape_mismatch_message() {
        let err = Tm1Error::ShapeMismatch { expected: 3, actual: 2 };
        assert!(err.to_string().contains("2 element(s)"));
        assert!(err.to_string().contains("3 dimension(s)"));
        assert!(!err.is_not_found());
    }
}
