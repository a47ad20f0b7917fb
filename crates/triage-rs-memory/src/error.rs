//! Error types for memory operations.

/// Errors returned by memory stores and helpers.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Key was empty or otherwise unusable.
    #[error("invalid memory key: {0:?}")]
    InvalidKey(String),
    /// Store file exists but does not hold a JSON object.
    #[error("corrupt memory file {path}: {reason}")]
    Corrupt { path: String, reason: String },
}
