//! Error types for feed retrieval.
//!
//! Every variant is a fetch failure from the planner's point of view: the
//! cycle is skipped and the baseline stays as it was.

/// Errors that can occur while fetching or parsing the event feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The HTTP request could not be sent or the body not read.
    #[error("feed transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("feed returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The fetch did not complete within its deadline.
    #[error("feed request timed out after {0} ms")]
    Timeout(u64),

    /// Reading a replay file failed.
    #[error("failed to read feed file {path}: {source}")]
    Io {
        /// The file being read.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The body is not valid JSON.
    #[error("feed JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but violates the feed contract.
    #[error("malformed feed: {0}")]
    Malformed(String),

    /// Feed settings are unusable.
    #[error("feed config error: {0}")]
    Config(String),
}
