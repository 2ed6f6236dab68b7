//! Error types for TwirTee
//!
//! Every failure a feature or task can produce is contained in this enum.
//! Only startup failures are allowed to escape to `main`.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// TwirTee error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // ========================================================================
    // Feature discovery
    // ========================================================================
    #[error("Failed to load feature unit '{unit}': {message}")]
    Discovery { unit: String, message: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    // ========================================================================
    // Option resolution
    // ========================================================================
    #[error("Invalid value for option '{option}': {message}")]
    InvalidOption { option: String, message: String },

    // ========================================================================
    // Task runtime / control
    // ========================================================================
    #[error("{0}")]
    Feature(String),

    #[error("Task {0} not found")]
    TaskNotFound(u64),

    #[error("Task {0} is still active")]
    TaskActive(u64),

    #[error("Failed to spawn worker: {0}")]
    Spawn(String),

    #[error("Cancelled")]
    Cancelled,

    // ========================================================================
    // External conversions
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Other
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the user can fix this by changing input
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::InvalidOption { .. }
                | Error::FeatureNotFound(_)
                | Error::TaskNotFound(_)
                | Error::TaskActive(_)
                | Error::Cancelled
        )
    }

    /// Discovery error helper
    pub fn discovery(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Discovery {
            unit: unit.into(),
            message: message.into(),
        }
    }

    /// Option-resolution error helper
    pub fn invalid_option(option: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidOption {
            option: option.into(),
            message: message.into(),
        }
    }

    /// Feature runtime error helper
    pub fn feature(message: impl Into<String>) -> Self {
        Error::Feature(message.into())
    }

    /// Turn a caught panic payload into a `Feature` error
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        Error::Feature(panic_message(payload))
    }
}

/// Best-effort text of a panic payload
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

// ============================================================================
// From conversions
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_option_message() {
        let err = Error::invalid_option("iterations", "expected an integer, got 'abc'");
        assert_eq!(
            err.to_string(),
            "Invalid value for option 'iterations': expected an integer, got 'abc'"
        );
        assert!(err.is_user_facing());
    }

    #[test]
    fn test_feature_error_is_plain() {
        let err = Error::feature("window not found");
        assert_eq!(err.to_string(), "window not found");
        assert!(!err.is_user_facing());
    }

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "panicked: boom");

        let payload = std::panic::catch_unwind(|| panic!("{} {}", "formatted", 1)).unwrap_err();
        assert_eq!(
            Error::from_panic(payload.as_ref()).to_string(),
            "panicked: formatted 1"
        );
    }
}
