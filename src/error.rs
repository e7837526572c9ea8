//! Error types for `winreg-helpers`
//!
//! Registry failures are classified into the conditions callers branch on
//! (`NotFound`, `AlreadyExists`, `InvalidName`) and a `Platform` catch-all that
//! carries the underlying OS error verbatim.
//!
//! Error variants use `#[source]` to preserve error chains.

use crate::registry::Root;
use std::io;
use thiserror::Error;

/// Simple error type for wrapping string messages while implementing `std::error::Error`
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StringError(pub String);

impl StringError {
    /// Create a new `StringError` from a string message
    pub fn new(msg: impl Into<String>) -> Box<Self> {
        Box::new(Self(msg.into()))
    }
}

/// Main error type for registry association operations
#[derive(Debug, Error)]
pub enum AssocError {
    /// Requested key, class or extension does not exist
    #[error("Registry key not found: {0}")]
    NotFound(String),

    /// Registration without `overwrite` hit an existing key
    #[error("Registry key already exists: {0}")]
    AlreadyExists(String),

    /// Class or extension name cannot be used as a single key name
    #[error("Invalid class name: {0:?}")]
    InvalidName(String),

    /// Any other OS-level registry failure (permission denied, invalid handle, ...)
    #[error("Registry operation failed on `{path}`: {source}")]
    Platform {
        /// Path of the key the operation targeted
        path: String,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// IO error outside the registry (manifest files, log directory)
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Configuration error
    /// Preserves the underlying error source for full error chain transparency
    #[error("Configuration error: {0}")]
    ConfigError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AssocError {
    /// Classify a registry IO error raised while operating on `path`.
    pub fn from_registry(error: io::Error, path: &str) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_string()),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(path.to_string()),
            _ => Self::Platform {
                path: path.to_string(),
                source: error,
            },
        }
    }

    /// Qualify the key path carried by this error with the hive it lives in.
    #[must_use]
    pub fn under(self, root: Root) -> Self {
        let qualify = |path: String| format!("{}\\{path}", root.hive_name());
        match self {
            Self::NotFound(path) => Self::NotFound(qualify(path)),
            Self::AlreadyExists(path) => Self::AlreadyExists(qualify(path)),
            Self::Platform { path, source } => Self::Platform {
                path: qualify(path),
                source,
            },
            other => other,
        }
    }

    /// Whether this error reports a missing key.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type alias for `winreg-helpers` operations
pub type Result<T> = std::result::Result<T, AssocError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AssocError::NotFound("Software\\Classes\\MyApp.Document".to_string());
        assert_eq!(
            error.to_string(),
            "Registry key not found: Software\\Classes\\MyApp.Document"
        );
    }

    #[test]
    fn test_from_registry_classifies_kinds() {
        let missing = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(AssocError::from_registry(missing, "a").is_not_found());

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let error = AssocError::from_registry(denied, "a\\b");
        match error {
            AssocError::Platform { path, source } => {
                assert_eq!(path, "a\\b");
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected Platform, got {other:?}"),
        }
    }

    #[test]
    fn test_under_prefixes_hive_name() {
        let error = AssocError::AlreadyExists("Software\\Classes\\.foo".to_string()).under(Root::CurrentUser);
        assert_eq!(
            error.to_string(),
            "Registry key already exists: HKEY_CURRENT_USER\\Software\\Classes\\.foo"
        );

        let error = AssocError::InvalidName(String::new()).under(Root::AllUsers);
        assert!(matches!(error, AssocError::InvalidName(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: AssocError = io_error.into();
        assert!(matches!(error, AssocError::IoError(_)));
    }

    #[test]
    fn test_config_error_keeps_source() {
        let error = AssocError::ConfigError(StringError::new("bad manifest"));
        assert_eq!(error.to_string(), "Configuration error: bad manifest");
        assert!(std::error::Error::source(&error).is_some());
    }
}
