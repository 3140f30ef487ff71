//! Failure kinds of a single resolution attempt.
//!
//! Callers of the pipeline never see these: every kind collapses to "not found"
//! at the pipeline boundary. They exist so the attempt can use `?` internally
//! and so logs can say why an attempt failed.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The browser binary could not be found or started.
    #[error("browser launch failed: {0}")]
    Launch(String),
    /// The media element never appeared within the wait budget.
    #[error("no element matching `{selector}` after {waited:?}")]
    Timeout { selector: String, waited: Duration },
    /// Scan finished without a token-bearing media URL.
    #[error("no token-bearing media URL in network log")]
    NotFound,
    /// A DevTools command (navigation, script, event subscription) failed.
    #[error("browser command failed: {0}")]
    Browser(String),
    /// The attempt panicked or the session limiter was shut down.
    #[error("resolution aborted: {0}")]
    Aborted(String),
}

impl ResolveError {
    /// Short stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::Launch(_) => "launch",
            ResolveError::Timeout { .. } => "timeout",
            ResolveError::NotFound => "not_found",
            ResolveError::Browser(_) => "browser",
            ResolveError::Aborted(_) => "aborted",
        }
    }
}
