use std::path::PathBuf;

/// Failure reported by a completion client for a single request
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompletionError {
    /// The API answered with an error status
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request never produced an HTTP response (DNS, connect, timeout, TLS)
    #[error("transport error: {0}")]
    Transport(String),

    /// The API answered 2xx but the body was not a usable completion
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Any other client-specific failure
    #[error("{0}")]
    Other(String),
}

impl CompletionError {
    pub fn other(message: impl Into<String>) -> Self {
        CompletionError::Other(message.into())
    }
}

/// Errors from writing or reading a persisted results table
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
