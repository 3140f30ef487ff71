//! One resolution attempt: launch, navigate, synchronize, scan, close.
//!
//! The session is closed exactly once whatever happens in between, including
//! a panic inside the attempt. Every failure collapses to `None` for the
//! caller; the failure kind only shows up in the logs.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use crate::browser::{BrowserSession, SessionFactory, SessionLimiter};
use crate::error::ResolveError;
use crate::network::{self, MatchRule};
use crate::playback::PlaybackSynchronizer;

pub struct ResolutionPipeline<F> {
    factory: F,
    sync: PlaybackSynchronizer,
    rule: MatchRule,
    limiter: SessionLimiter,
}

impl<F: SessionFactory> ResolutionPipeline<F> {
    pub fn new(
        factory: F,
        sync: PlaybackSynchronizer,
        rule: MatchRule,
        limiter: SessionLimiter,
    ) -> Self {
        Self {
            factory,
            sync,
            rule,
            limiter,
        }
    }

    pub fn limiter(&self) -> &SessionLimiter {
        &self.limiter
    }

    /// Resolves `embed_url` to a token-bearing media URL, or `None` on any failure.
    pub async fn resolve(&self, embed_url: &str) -> Option<String> {
        let started = Instant::now();
        match self.try_resolve(embed_url).await {
            Ok(url) => {
                tracing::info!(
                    embed_url,
                    media_url = %url,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "resolved"
                );
                Some(url)
            }
            Err(e) => {
                tracing::info!(
                    embed_url,
                    kind = e.kind(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "not resolved: {}",
                    e
                );
                None
            }
        }
    }

    /// Same as [`Self::resolve`] but keeps the failure kind.
    pub async fn try_resolve(&self, embed_url: &str) -> Result<String, ResolveError> {
        let _permit = self.limiter.acquire().await?;
        let mut session = self.factory.open().await?;

        let outcome = AssertUnwindSafe(self.drive(session.as_mut(), embed_url))
            .catch_unwind()
            .await;
        session.close().await;

        match outcome {
            Ok(result) => result,
            Err(panic) => Err(ResolveError::Aborted(panic_message(panic.as_ref()))),
        }
    }

    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        embed_url: &str,
    ) -> Result<String, ResolveError> {
        session.navigate(embed_url).await?;
        self.sync.run(session).await?;
        let events = session.network_log().await?;
        network::scan(&events, &self.rule)
            .map(str::to_string)
            .ok_or(ResolveError::NotFound)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during resolution".to_string()
    }
}

#[cfg(test)]
mod tests;
