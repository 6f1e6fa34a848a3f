//! Feed configuration: the generation server's base HTTP origin.
//!
//! The origin is read once and serves two purposes: it is rewritten into
//! the WebSocket endpoint (`http` -> `ws`, `https` -> `wss`) and it is
//! the base against which relative asset paths are resolved.

use std::time::Duration;

use url::Url;

use crate::error::FeedConfigError;

/// Environment variable holding the server origin, e.g. `https://host:8000`.
pub const ENV_SERVER_URL: &str = "GENFEED_SERVER_URL";

/// Environment variable overriding the reconnect delay in milliseconds.
pub const ENV_RECONNECT_DELAY_MS: &str = "GENFEED_RECONNECT_DELAY_MS";

/// Fixed delay between a close and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Validated feed configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Parsed server origin.
    server_url: Url,
    /// Origin text without a trailing slash, used for concatenation.
    base: String,
    /// WebSocket endpoint derived from the origin.
    endpoint: Url,
    reconnect_delay: Duration,
}

impl FeedConfig {
    /// Validate `server_url` and derive the transport endpoint.
    ///
    /// The URL must use `http` or `https`; the URL parser rejects an
    /// empty host for both.
    pub fn new(server_url: &str) -> Result<Self, FeedConfigError> {
        let trimmed = server_url.trim();
        if trimmed.is_empty() {
            return Err(FeedConfigError::Missing(ENV_SERVER_URL));
        }

        let parsed = Url::parse(trimmed).map_err(|source| FeedConfigError::InvalidUrl {
            url: trimmed.to_string(),
            source,
        })?;

        let ws_scheme = match parsed.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => return Err(FeedConfigError::UnsupportedScheme(other.to_string())),
        };

        let mut endpoint = parsed.clone();
        endpoint
            .set_scheme(ws_scheme)
            .map_err(|()| FeedConfigError::UnsupportedScheme(parsed.scheme().to_string()))?;

        Ok(Self {
            base: parsed.as_str().trim_end_matches('/').to_string(),
            server_url: parsed,
            endpoint,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `GENFEED_SERVER_URL`         | --      |
    /// | `GENFEED_RECONNECT_DELAY_MS` | `3000`  |
    pub fn from_env() -> Result<Self, FeedConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value. [`from_env`](Self::from_env) reads the process environment.
    ///
    /// A zero reconnect delay is rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FeedConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_url = lookup(ENV_SERVER_URL).ok_or(FeedConfigError::Missing(ENV_SERVER_URL))?;
        let config = Self::new(&server_url)?;

        match lookup(ENV_RECONNECT_DELAY_MS) {
            Some(raw) => {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| FeedConfigError::InvalidDelay(raw.clone()))?;
                if ms == 0 {
                    return Err(FeedConfigError::InvalidDelay(raw));
                }
                Ok(config.with_reconnect_delay(Duration::from_millis(ms)))
            }
            None => Ok(config),
        }
    }

    /// Override the fixed reconnect delay.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// The configured origin as a parsed URL.
    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    /// Origin text without trailing slash (e.g. `https://api.example.com`).
    pub fn base(&self) -> &str {
        &self.base
    }

    /// WebSocket endpoint (e.g. `wss://api.example.com/`).
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }
}
