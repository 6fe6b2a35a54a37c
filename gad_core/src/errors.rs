//! # Error Types
//!
//! Structured error types for gad_core. Every category is user-visible:
//! the CLI maps each one to a diagnostic and an exit status, and absorbed
//! errors (plugin and network failures) are logged with their code.
//!
//! ## Example
//!
//! ```rust
//! use gad_core::errors::{GadError, GadResult};
//!
//! fn validate_span(span_m: f64) -> GadResult<()> {
//!     if span_m <= 0.0 {
//!         return Err(GadError::domain("span", span_m, "must be greater than zero"));
//!     }
//!     Ok(())
//! }
//!
//! assert_eq!(validate_span(-1.0).unwrap_err().exit_code(), 2);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for gad_core operations
pub type GadResult<T> = Result<T, GadError>;

/// Structured error type for kernel, I/O and plugin operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum GadError {
    /// A kernel argument is outside its domain (non-finite, negative, zero)
    #[error("Domain error for '{argument}': {value} - {reason}")]
    Domain {
        argument: String,
        value: String,
        reason: String,
    },

    /// Tabular input could not be read or lacks required columns/keys
    #[error("Input format error in '{path}': {reason}")]
    InputFormat { path: String, reason: String },

    /// Results could not be written
    #[error("Output error on '{path}': {reason}")]
    Output { path: String, reason: String },

    /// Configuration file is unparseable or holds values of the wrong type
    #[error("Config error in '{path}': {reason}")]
    Config { path: String, reason: String },

    /// Registry catalog exists but is malformed
    #[error("Registry error in '{path}': {reason}")]
    Registry { path: String, reason: String },

    /// Plugin generator refused to overwrite an existing module
    #[error("Plugin '{name}' already exists at '{path}'")]
    DuplicatePlugin { name: String, path: String },

    /// No plugin with the requested name was discovered
    #[error("Plugin not found: {name}")]
    PluginNotFound { name: String },

    /// A plugin's run action failed (raised inside the sandboxed child)
    #[error("Plugin '{name}' failed: {reason}")]
    PluginFailed { name: String, reason: String },

    /// An input value is invalid (blank names, bad paths, ...)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// File I/O error outside the categories above
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON/TOML serialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl GadError {
    /// Create a Domain error
    pub fn domain(argument: impl Into<String>, value: f64, reason: impl Into<String>) -> Self {
        GadError::Domain {
            argument: argument.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an InputFormat error
    pub fn input_format(path: impl Into<String>, reason: impl Into<String>) -> Self {
        GadError::InputFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an Output error
    pub fn output(path: impl Into<String>, reason: impl Into<String>) -> Self {
        GadError::Output {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a Config error
    pub fn config(path: impl Into<String>, reason: impl Into<String>) -> Self {
        GadError::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a Registry error
    pub fn registry(path: impl Into<String>, reason: impl Into<String>) -> Self {
        GadError::Registry {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a DuplicatePlugin error
    pub fn duplicate_plugin(name: impl Into<String>, path: impl Into<String>) -> Self {
        GadError::DuplicatePlugin {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Create a PluginNotFound error
    pub fn plugin_not_found(name: impl Into<String>) -> Self {
        GadError::PluginNotFound { name: name.into() }
    }

    /// Create a PluginFailed error
    pub fn plugin_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        GadError::PluginFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        GadError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        GadError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            GadError::Domain { .. } => "DOMAIN_ERROR",
            GadError::InputFormat { .. } => "INPUT_FORMAT_ERROR",
            GadError::Output { .. } => "OUTPUT_ERROR",
            GadError::Config { .. } => "CONFIG_ERROR",
            GadError::Registry { .. } => "REGISTRY_ERROR",
            GadError::DuplicatePlugin { .. } => "DUPLICATE_PLUGIN",
            GadError::PluginNotFound { .. } => "PLUGIN_NOT_FOUND",
            GadError::PluginFailed { .. } => "PLUGIN_FAILED",
            GadError::InvalidInput { .. } => "INVALID_INPUT",
            GadError::FileError { .. } => "FILE_ERROR",
            GadError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }

    /// Process exit status the CLI reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            GadError::Domain { .. } | GadError::InputFormat { .. } | GadError::Config { .. } => 2,
            GadError::Output { .. } => 3,
            GadError::DuplicatePlugin { .. } => 4,
            _ => 1,
        }
    }
}
