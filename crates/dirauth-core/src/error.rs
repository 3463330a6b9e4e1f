//! Error types for directory authentication operations.
//!
//! Lookup misses and rejected logins are *not* errors in this taxonomy: a
//! lookup that finds nothing yields `Ok(None)` and a failed credential check
//! yields `false`. The variants here cover the faults that callers can act
//! on — an unreachable server, a rejected service bind, a timed-out
//! operation, or bad configuration.

use thiserror::Error;

/// Main error type for directory authentication operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The directory server could not be reached
    #[error("could not connect to directory server: {0}")]
    ConnectionFailed(String),

    /// The service-account bind was rejected by the server
    #[error("service account bind rejected: {0}")]
    BindRejected(String),

    /// A directory operation exceeded its deadline
    #[error("directory operation timed out: {0}")]
    Timeout(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A distinguished name could not be parsed
    #[error("invalid distinguished name: {0}")]
    InvalidDn(String),

    /// Directory protocol error that is surfaced rather than swallowed
    #[error("directory protocol error: {0}")]
    Directory(String),
}

/// Specialized result type for directory authentication operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the stable error code for this error type.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::BindRejected(_) => "BIND_REJECTED",
            Self::Timeout(_) => "TIMEOUT",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidDn(_) => "INVALID_DN",
            Self::Directory(_) => "DIRECTORY_ERROR",
        }
    }

    /// Returns true if this error is fatal to resolver construction.
    ///
    /// Connection and bind failures are not retried by this layer; whatever
    /// constructs the resolver decides whether to restart or give up.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::BindRejected(_) | Self::ConfigError(_)
        )
    }
}

// Conversions from external error types
impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::ConnectionFailed("test".to_string()).error_code(),
            "CONNECTION_FAILED"
        );
        assert_eq!(
            Error::BindRejected("test".to_string()).error_code(),
            "BIND_REJECTED"
        );
        assert_eq!(Error::Timeout("test".to_string()).error_code(), "TIMEOUT");
        assert_eq!(
            Error::ConfigError("test".to_string()).error_code(),
            "CONFIG_ERROR"
        );
        assert_eq!(
            Error::InvalidDn("test".to_string()).error_code(),
            "INVALID_DN"
        );
        assert_eq!(
            Error::Directory("test".to_string()).error_code(),
            "DIRECTORY_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::ConnectionFailed("dc01.corp.example.com".to_string());
        assert_eq!(
            err.to_string(),
            "could not connect to directory server: dc01.corp.example.com"
        );

        let err = Error::BindRejected("invalid credentials (49)".to_string());
        assert_eq!(
            err.to_string(),
            "service account bind rejected: invalid credentials (49)"
        );
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::ConnectionFailed("test".to_string()).is_fatal());
        assert!(Error::BindRejected("test".to_string()).is_fatal());
        assert!(Error::ConfigError("test".to_string()).is_fatal());

        assert!(!Error::Timeout("test".to_string()).is_fatal());
        assert!(!Error::Directory("test".to_string()).is_fatal());
    }

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let auth_err: Error = err.into();
        assert!(matches!(auth_err, Error::ConfigError(_)));
    }

    #[test]
    fn test_error_clone_and_eq() {
        let err = Error::Timeout("read".to_string());
        assert_eq!(err.clone(), err);
        assert_ne!(err, Error::Timeout("bind".to_string()));
    }
}
