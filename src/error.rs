//! Error types for cgit-slim
//!
//! Centralized error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

use crate::supervisor::Role;

/// All error types that can occur in the supervisor and the sync daemon
#[derive(Debug, Error)]
pub enum SlimError {
    /// A supervised service could not be launched
    #[error("Failed to spawn {role} service {}: {source}", path.display())]
    Spawn {
        role: Role,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Installing a signal disposition failed
    #[error("Signal error: {0}")]
    Signal(nix::Error),

    /// The generic wait for child processes failed
    #[error("Wait error: {0}")]
    Wait(nix::Error),

    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for cgit-slim operations
pub type Result<T> = std::result::Result<T, SlimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_error_names_role_and_path() {
        let err = SlimError::Spawn {
            role: Role::Web,
            path: PathBuf::from("/bin/nginx"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to spawn web service /bin/nginx: No such file or directory"
        );
    }

    #[test]
    fn test_wait_error() {
        let err = SlimError::Wait(nix::Error::ECHILD);
        assert!(err.to_string().starts_with("Wait error:"));
    }

    #[test]
    fn test_config_error() {
        let err = SlimError::Config("missing path".to_string());
        assert_eq!(err.to_string(), "Config error: missing path");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SlimError = io_err.into();
        assert!(matches!(err, SlimError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(SlimError::Config("test".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
