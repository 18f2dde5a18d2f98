//! Error types for the template engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or rendering a template.
///
/// Rendering itself fails open: unresolved names and malformed directives
/// never produce an error. Only the top-level template file can be missing.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template not found: {name} ({})", path.display())]
    TemplateNotFound { name: String, path: PathBuf },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid config: {message}")]
    Invalid { message: String },
}

/// Result type alias for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
