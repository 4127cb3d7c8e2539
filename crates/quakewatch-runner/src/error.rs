//! Error types for the Quakewatch binary.
//!
//! [`RefreshError`] covers every failure that stops the process from
//! starting. Once the loop is running, cycle failures are logged and
//! recorded, never propagated.

/// Top-level startup error.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: quakewatch_core::config::ConfigError,
    },

    /// The feed source could not be built.
    #[error("feed error: {source}")]
    Feed {
        /// The underlying feed error.
        #[from]
        source: quakewatch_feed::FeedError,
    },

    /// An output sink could not be created.
    #[error("sink error: {source}")]
    Sink {
        /// The underlying sink error.
        #[from]
        source: quakewatch_core::sink::SinkError,
    },

    /// Observer API server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: quakewatch_observer::StartupError,
    },

    /// The tracing subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
