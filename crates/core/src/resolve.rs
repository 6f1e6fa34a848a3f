//! Asset path resolution.
//!
//! Servers report generated assets either as a root-relative path
//! (`/files/a.glb`) or as an absolute URL. Absolute URLs pointing at
//! `localhost` are the server's bind address, not an address the client
//! can reach, so their scheme and authority are replaced with the
//! configured origin's.

use url::Url;

use crate::config::FeedConfig;

/// Host name treated as the server's own bind address.
const LOOPBACK_HOST: &str = "localhost";

/// Resolve an optional asset path into an absolute URL.
///
/// Returns `None` when the path is absent, empty, or cannot be turned
/// into a valid URL.
pub fn resolve_model_url(config: &FeedConfig, path: Option<&str>) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;

    if is_absolute(path) {
        resolve_absolute(config.server_url(), path)
    } else {
        resolve_relative(config.base(), path)
    }
}

/// `true` for paths starting with `http://` or `https://` (any case).
fn is_absolute(path: &str) -> bool {
    let lower = path.get(..8).unwrap_or(path).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn resolve_absolute(server_url: &Url, path: &str) -> Option<String> {
    let parsed = Url::parse(path).ok()?;

    if parsed.host_str() != Some(LOOPBACK_HOST) {
        return Some(path.to_string());
    }

    let mut rewritten = parsed;
    rewritten.set_scheme(server_url.scheme()).ok()?;
    rewritten.set_host(server_url.host_str()).ok()?;
    rewritten.set_port(server_url.port()).ok()?;
    Some(rewritten.into())
}

fn resolve_relative(base: &str, path: &str) -> Option<String> {
    let joined = if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    };
    Url::parse(&joined).ok().map(|_| joined)
}
