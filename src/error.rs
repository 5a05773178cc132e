//! Error handling module for rosdistro-filter
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Every fallible operation in the library returns these types.

use thiserror::Error;

/// Main error type for the filter pipeline
#[derive(Error, Debug)]
pub enum FilterError {
    /// The package index produced no usable package names
    #[error("No packages found in the package index: {0}")]
    EmptyCandidateSet(String),

    /// An external process or remote service could not be reached or failed
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// A document does not have the expected shape
    #[error("Malformed manifest: {0}")]
    MalformedManifest(String),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors (reading overrides, writing outputs)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for filter operations
pub type Result<T> = std::result::Result<T, FilterError>;

impl FilterError {
    /// Create an empty candidate set error
    pub fn empty_candidates(msg: impl Into<String>) -> Self {
        Self::EmptyCandidateSet(msg.into())
    }

    /// Create a collaborator error
    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::CollaboratorUnavailable(msg.into())
    }

    /// Create a malformed manifest error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedManifest(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
