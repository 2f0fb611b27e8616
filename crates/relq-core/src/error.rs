//! Error types for relq-core

use thiserror::Error;

/// Core error type for relq
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Invalid configuration value
    #[error("[E002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E003: An identifier was empty or contained only whitespace
    #[error("[E003] {kind} must not be empty")]
    EmptyIdentifier { kind: &'static str },

    /// E004: Two entities share a name in one catalog
    #[error("[E004] Duplicate entity '{name}' in model catalog")]
    DuplicateEntity { name: String },

    /// E005: Two properties share a name on one entity
    #[error("[E005] Duplicate property '{property}' on entity '{entity}'")]
    DuplicateProperty { entity: String, property: String },

    /// E006: Two properties of one entity map to the same column
    #[error("[E006] Properties '{first}' and '{second}' of entity '{entity}' both map to column '{column}'")]
    DuplicateColumn {
        entity: String,
        first: String,
        second: String,
        column: String,
    },

    /// E007: IO error with file path context
    #[error("[E007] IO error on {path}: {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E008: YAML parse error
    #[error("[E008] YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
