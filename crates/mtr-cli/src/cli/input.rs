//! Embed URL input checks. The URL is parsed only to reject junk; the original
//! string is what gets resolved and cached.

use anyhow::Result;
use url::Url;

/// Accepts absolute http(s) URLs and returns the input trimmed of surrounding whitespace.
pub fn validate_embed_url(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        anyhow::bail!("missing embed URL");
    }
    let parsed = Url::parse(trimmed).map_err(|e| anyhow::anyhow!("invalid embed URL {trimmed:?}: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => anyhow::bail!("unsupported scheme {other:?} in embed URL"),
    }
    if parsed.host_str().is_none() {
        anyhow::bail!("embed URL has no host");
    }
    Ok(trimmed)
}
