use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
#[derive(Debug, Error)]
pub enum Error {
    /// No source root could be derived from the configuration or environment
    #[error("unable to determine the source root (set ROUTEDOC_SOURCE_ROOT)")]
    SourceRootUnavailable,

    /// A renderer was asked to document a router that was never supplied
    #[error("router is nil")]
    NilRouter,

    /// `Raml::add_under` was given a parent route it cannot nest under
    #[error("invalid parent route {parent:?}: {reason}")]
    InvalidParent { parent: String, reason: &'static str },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
