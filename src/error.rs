//! Error types with actionable diagnostics.
//!
//! Every variant carries enough context to act on the failure without
//! reading the source: which slot, which file, which learning type.

use std::path::PathBuf;
use thiserror::Error;

use crate::callback::ComponentSlot;
use crate::learning_type::LearningType;

/// Result type alias for anomalo operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A value had the wrong type for the place it was used.
    Type,
    /// A behaviour has no built-in implementation for this configuration.
    NotImplemented,
    /// A file that was expected to exist does not.
    NotFound,
    /// A value had the right type but an unacceptable content.
    Value,
    /// Tensor shapes or model state prevented the operation.
    Runtime,
    /// Underlying IO failure.
    Io,
}

/// Errors raised by the module pipeline, its components and the config factory.
#[derive(Error, Debug)]
pub enum Error {
    /// A component slot received something that is neither an instance nor a flag.
    #[error("Invalid {slot} argument: expected a {slot} configuration or a boolean, got {found}\n  → Use `true` for the default, `false` to disable, or a mapping to customise it")]
    InvalidComponent { slot: ComponentSlot, found: String },

    /// No default post-processor exists for the model's learning type.
    #[error("No default post-processor available for model with learning type {learning_type}\n  → Override configure_post_processor or pass an explicit post-processor")]
    NoDefaultPostProcessor { learning_type: LearningType },

    /// Configuration file not found at expected path.
    #[error("Configuration file not found: {path}\n  → Check the path or create the config file")]
    ConfigNotFound { path: PathBuf },

    /// Configuration file has invalid syntax.
    #[error("Invalid configuration syntax in {path}:\n  {message}\n  → Check YAML syntax at the indicated line")]
    ConfigParsing { path: PathBuf, message: String },

    /// Configuration value is invalid.
    #[error("Invalid configuration value for '{field}': {message}\n  → {suggestion}")]
    ConfigValue {
        field: String,
        message: String,
        suggestion: String,
    },

    /// The configured class path is not registered.
    #[error("Unknown class path '{class_path}'\n  → Registered: {}", available.join(", "))]
    UnknownClassPath {
        class_path: String,
        available: Vec<String>,
    },

    /// The instantiated object is not an anomaly module of the expected type.
    #[error("Model is not an instance of {expected}: {found}")]
    InvalidModel { expected: String, found: String },

    /// Invalid tensor shape.
    #[error("Tensor shape mismatch: expected {expected:?}, got {actual:?}\n  → Check the pre-processor output size against the model input size")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// The model was used before it was built or fitted.
    #[error("Model '{name}' is not ready: {message}\n  → Call setup() and fit the model before inference")]
    ModelNotReady { name: String, message: String },

    /// IO error with context.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl Error {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a configuration value error.
    pub fn config_value(
        field: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::ConfigValue {
            field: field.into(),
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidComponent { .. } => ErrorKind::Type,
            Self::NoDefaultPostProcessor { .. } => ErrorKind::NotImplemented,
            Self::ConfigNotFound { .. } => ErrorKind::NotFound,
            Self::ConfigParsing { .. }
            | Self::ConfigValue { .. }
            | Self::UnknownClassPath { .. }
            | Self::InvalidModel { .. }
            | Self::Serialization { .. } => ErrorKind::Value,
            Self::ShapeMismatch { .. } | Self::ModelNotReady { .. } => ErrorKind::Runtime,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Check if this error is user-recoverable.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidComponent { .. }
                | Self::NoDefaultPostProcessor { .. }
                | Self::ConfigNotFound { .. }
                | Self::ConfigParsing { .. }
                | Self::ConfigValue { .. }
                | Self::UnknownClassPath { .. }
                | Self::InvalidModel { .. }
        )
    }

    /// Get the error code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidComponent { .. } => "E001",
            Self::NoDefaultPostProcessor { .. } => "E002",
            Self::ConfigNotFound { .. } => "E010",
            Self::ConfigParsing { .. } => "E011",
            Self::ConfigValue { .. } => "E012",
            Self::UnknownClassPath { .. } => "E013",
            Self::InvalidModel { .. } => "E014",
            Self::ShapeMismatch { .. } => "E020",
            Self::ModelNotReady { .. } => "E021",
            Self::Io { .. } => "E030",
            Self::Serialization { .. } => "E031",
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_errors() -> Vec<Error> {
        vec![
            Error::InvalidComponent {
                slot: ComponentSlot::PreProcessor,
                found: "number".into(),
            },
            Error::NoDefaultPostProcessor {
                learning_type: LearningType::ZeroShot,
            },
            Error::ConfigNotFound { path: "".into() },
            Error::ConfigParsing {
                path: "".into(),
                message: "".into(),
            },
            Error::config_value("", "", ""),
            Error::UnknownClassPath {
                class_path: "".into(),
                available: vec![],
            },
            Error::InvalidModel {
                expected: "".into(),
                found: "".into(),
            },
            Error::ShapeMismatch {
                expected: vec![],
                actual: vec![],
            },
            Error::ModelNotReady {
                name: "".into(),
                message: "".into(),
            },
            Error::io("", std::io::Error::new(std::io::ErrorKind::Other, "x")),
            Error::Serialization {
                message: "".into(),
            },
        ]
    }

    #[test]
    fn test_error_codes_are_unique() {
        let errors = all_errors();
        let codes: std::collections::HashSet<_> = errors.iter().map(Error::code).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_invalid_component_names_slot_and_type() {
        let err = Error::InvalidComponent {
            slot: ComponentSlot::Visualizer,
            found: "string".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("visualizer"));
        assert!(msg.contains("string"));
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_no_default_post_processor_is_not_implemented() {
        let err = Error::NoDefaultPostProcessor {
            learning_type: LearningType::FewShot,
        };
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
        assert!(err.to_string().contains("few_shot"));
        assert!(err.to_string().contains("configure_post_processor"));
    }

    #[test]
    fn test_config_not_found_mentions_path() {
        let err = Error::ConfigNotFound {
            path: "/tmp/missing.yaml".into(),
        };
        assert!(err.to_string().contains("missing.yaml"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.is_user_error());
    }

    #[test]
    fn test_unknown_class_path_lists_registered() {
        let err = Error::UnknownClassPath {
            class_path: "Padim".into(),
            available: vec!["PixelStats".into(), "Other".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Padim"));
        assert!(msg.contains("PixelStats, Other"));
    }

    #[test]
    fn test_runtime_errors_are_not_user_errors() {
        let err = Error::ShapeMismatch {
            expected: vec![1, 2],
            actual: vec![1, 3],
        };
        assert!(!err.is_user_error());
        assert_eq!(err.kind(), ErrorKind::Runtime);
    }

    #[test]
    fn test_io_error_constructor() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::io("reading config", io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("reading config"));
    }
}
