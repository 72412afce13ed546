//! Configuration system error types.
//!
//! Every fallible operation in this crate reports failure through
//! `ConfigurationError`: construction-time validation, backing-source
//! access, connection validation and illegal cross-kind adaptor calls.

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Configuration system errors.
///
/// Lookups that find nothing are not errors; they return `None` or an
/// empty list. These variants are reserved for invalid input, failed
/// backing sources and operations an adaptor cannot perform.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Required field missing on {entity}: {field}")]
    RequiredFieldMissing { entity: String, field: String },

    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to access configuration file: {path} - {reason}")]
    FileAccessError { path: String, reason: String },

    #[error("Failed to parse configuration: {reason}")]
    ParseError { reason: String },

    #[error("Failed to connect to location '{location}': {reason}")]
    ConnectionFailed { location: String, reason: String },

    #[error("Connection to location '{location}' timed out after {seconds}s")]
    ConnectionTimeout { location: String, seconds: u64 },

    #[error("Adaptor '{adaptor}' has no location-compatible backing source")]
    NoLocationBacking { adaptor: String },

    #[error("Unsupported location '{location}': {reason}")]
    UnsupportedLocation { location: String, reason: String },

    #[error("Backing source for adaptor '{adaptor}' failed: {reason}")]
    BackingSourceFailed { adaptor: String, reason: String },

    #[error("Dataset config '{dataset}' is owned by '{owner}' and cannot be loaded by adaptor '{adaptor}'")]
    ForeignDatasetConfig {
        adaptor: String,
        owner: String,
        dataset: String,
    },

    #[error("Template '{template}' defines no dynamic dataset named '{dataset}'")]
    UnknownDynamicDataset { template: String, dataset: String },

    #[error("Template '{template}' must be loaded before it can be specialized")]
    TemplateNotLoaded { template: String },
}

/// Result type alias for configuration operations.
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;
