//! Error types for the Mouette schema linter.
//!
//! All fallible operations in the crate return [`LintError`]. The enum is
//! `Clone` because a single in-flight introspection query is shared by every
//! rule waiting on it, and each waiter receives its own copy of the outcome.

use std::sync::Arc;
use thiserror::Error;

/// The main error type for the Mouette library.
#[derive(Error, Debug, Clone)]
pub enum LintError {
    /// Invalid rule options or configuration. Raised before any database access.
    #[error("Configuration error for '{rule}': {message}")]
    Configuration {
        /// Rule (or configuration source) the error belongs to
        rule: String,
        /// Human-readable explanation
        message: String,
    },

    /// The store is unreachable or the connection dropped mid-run.
    #[error("Connection error: {0}")]
    Connection(String),

    /// An accessor was called after the facade was closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// A query executed but the store reported a fault.
    #[error("Database error in collection '{collection}': {message}")]
    Database {
        /// Collection the failing query ran against
        collection: String,
        /// Detailed error message
        message: String,
    },

    /// A rule reached a branch for an option value that validation should have rejected.
    #[error("Unknown value '{value}' for option '{option}' of rule '{rule}'")]
    UnknownOptionValue {
        /// Rule name
        rule: String,
        /// Option name
        option: String,
        /// The offending value
        value: String,
    },

    /// A test double accessor was called without being mocked.
    #[error("{0} must be mocked")]
    NotMocked(&'static str),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, LintError>`.
pub type Result<T> = std::result::Result<T, LintError>;

impl LintError {
    /// Creates a new configuration error.
    pub fn configuration(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// Creates a new database error.
    pub fn database(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Creates a new unknown option value error.
    pub fn unknown_option_value(
        rule: impl Into<String>,
        option: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self::UnknownOptionValue {
            rule: rule.into(),
            option: option.into(),
            value: value.to_string(),
        }
    }

    /// Returns true for errors that mean the underlying connection is unusable.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::ConnectionClosed)
    }

    /// Returns true for option validation errors.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

impl From<std::io::Error> for LintError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(Arc::new(error))
    }
}

impl From<serde_json::Error> for LintError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<serde_yaml::Error> for LintError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for LintError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<std::fmt::Error> for LintError {
    fn from(error: std::fmt::Error) -> Self {
        Self::Internal(format!("formatting failed: {error}"))
    }
}

impl From<regex::Error> for LintError {
    fn from(error: regex::Error) -> Self {
        Self::Internal(format!("invalid regular expression: {error}"))
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<LintError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| wrap(msg, e.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(&f(), e.into()))
    }
}

// Connection and database errors keep their variant so callers can still
// tell them apart after context was added.
fn wrap(msg: &str, error: LintError) -> LintError {
    match error {
        LintError::Connection(inner) => LintError::Connection(format!("{msg}: {inner}")),
        LintError::Database {
            collection,
            message,
        } => LintError::Database {
            collection,
            message: format!("{msg}: {message}"),
        },
        LintError::Configuration { rule, message } => LintError::Configuration {
            rule,
            message: format!("{msg}: {message}"),
        },
        LintError::Internal(inner) => LintError::Internal(format!("{msg}: {inner}")),
        other => LintError::Internal(format!("{msg}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error() {
        let err = LintError::configuration("no-null", "unexpected option 'foo'");
        assert_eq!(
            err.to_string(),
            "Configuration error for 'no-null': unexpected option 'foo'"
        );
        assert!(err.is_configuration_error());
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_database_error() {
        let err = LintError::database("users", "bad $type operand");
        assert_eq!(
            err.to_string(),
            "Database error in collection 'users': bad $type operand"
        );
    }

    #[test]
    fn test_not_mocked() {
        let err = LintError::NotMocked("collection_names");
        assert_eq!(err.to_string(), "collection_names must be mocked");
    }

    #[test]
    fn test_connection_errors_are_detected() {
        assert!(LintError::Connection("refused".into()).is_connection_error());
        assert!(LintError::ConnectionClosed.is_connection_error());
    }

    #[test]
    fn test_error_context_keeps_connection_variant() {
        let result: Result<()> = Err(LintError::Connection("reset by peer".into()));
        let err = result.context("listing collections").unwrap_err();
        assert!(err.is_connection_error());
        assert!(err.to_string().contains("listing collections"));
    }

    #[test]
    fn test_error_context_on_foreign_error() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = result.with_context(|| "reading mouette.toml".to_string()).unwrap_err();
        assert!(matches!(err, LintError::Internal(_)));
        assert!(err.to_string().contains("reading mouette.toml"));
    }
}
