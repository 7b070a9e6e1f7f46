//! Model artifact error types.

use std::path::PathBuf;

/// Errors raised while locating, verifying or deserializing a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Model artifact not found at {0:?}")]
    NotFound(PathBuf),

    #[error("Failed to read model artifact {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed model artifact: {0}")]
    Malformed(String),

    #[error("Model signature verification failed: {0}")]
    Signature(String),
}
