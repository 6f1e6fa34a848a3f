/// Errors raised while building a [`FeedConfig`](crate::config::FeedConfig).
///
/// These are fatal: a feed with a bad origin is never constructed and
/// never retried.
#[derive(Debug, thiserror::Error)]
pub enum FeedConfigError {
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),

    #[error("Invalid server URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported scheme {0:?}, expected http or https")]
    UnsupportedScheme(String),

    #[error("Invalid reconnect delay: {0}")]
    InvalidDelay(String),
}

/// A frame that could not be turned into a server event.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Failed to decode frame: {0}")]
    Decode(#[from] serde_json::Error),
}
