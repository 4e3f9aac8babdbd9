//! Error types for dwh-core

use thiserror::Error;

/// Core error type for the warehouse ETL
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// E003: Missing configuration key
    #[error("[E003] Missing config key [{section}] {key}")]
    ConfigMissingKey { section: String, key: String },

    /// E004: Invalid configuration value
    #[error("[E004] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E005: Circular dependency detected
    #[error("[E005] Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// E006: Table referenced but not defined in the catalog
    #[error("[E006] Unknown table '{name}' referenced by {referenced_by}")]
    UnknownTable { name: String, referenced_by: String },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
