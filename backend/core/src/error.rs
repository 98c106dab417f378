use thiserror::Error;

/// Top-level error type for the mdforge editor core.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("invalid path: {0:?}")]
    InvalidPath(Vec<usize>),

    #[error("invalid node: {0}")]
    InvalidNode(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("plugin error ({plugin}): {message}")]
    Plugin { plugin: String, message: String },

    #[error("upload failed: {0}")]
    Upload(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
