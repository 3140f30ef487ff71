//! Cache-aside front door: `resolve_token(embed_url) -> { mediaUrl }`.
//!
//! [`TokenResolver`] only depends on the [`MediaResolver`] trait, so it does not
//! know about browsers; the pipeline is one implementation and tests use fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::browser::{ChromeLauncher, LaunchOptions, SessionFactory, SessionLimiter};
use crate::cache::{self, ResolutionCache};
use crate::config::MtrConfig;
use crate::pipeline::ResolutionPipeline;
use crate::playback::PlaybackSynchronizer;

/// Caller-visible result: a media URL, or `null` when nothing was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResolution {
    pub media_url: Option<String>,
}

impl TokenResolution {
    pub fn found(media_url: impl Into<String>) -> Self {
        Self {
            media_url: Some(media_url.into()),
        }
    }

    pub fn not_found() -> Self {
        Self { media_url: None }
    }

    pub fn is_found(&self) -> bool {
        self.media_url.is_some()
    }
}

/// The expensive source consulted on a cache miss.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, embed_url: &str) -> Option<String>;
}

#[async_trait]
impl<F: SessionFactory> MediaResolver for ResolutionPipeline<F> {
    async fn resolve(&self, embed_url: &str) -> Option<String> {
        ResolutionPipeline::resolve(self, embed_url).await
    }
}

pub struct TokenResolver<R> {
    source: R,
    cache: ResolutionCache,
}

impl<R: MediaResolver> TokenResolver<R> {
    pub fn new(source: R, cache: ResolutionCache) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Cached URL if fresh; otherwise one resolution attempt. Only successes are cached.
    pub async fn resolve_token(&self, embed_url: &str) -> TokenResolution {
        if let Some(cached) = self.cache.get(embed_url).await {
            tracing::debug!(embed_url, "cache hit");
            return TokenResolution::found(cached);
        }
        tracing::debug!(embed_url, "cache miss");
        self.resolve_uncached(embed_url, true).await
    }

    /// Skips the cache read. The result is still written back when `store` is set.
    pub async fn resolve_uncached(&self, embed_url: &str, store: bool) -> TokenResolution {
        match self.source.resolve(embed_url).await {
            Some(media_url) => {
                if store {
                    self.cache.put(embed_url, &media_url).await;
                }
                TokenResolution::found(media_url)
            }
            None => TokenResolution::not_found(),
        }
    }
}

/// Resolver wired to real Chrome sessions.
pub type ChromeTokenResolver = TokenResolver<ResolutionPipeline<ChromeLauncher>>;

impl ChromeTokenResolver {
    /// Builds the process-wide resolver: cache store, session limiter and launcher from `cfg`.
    pub async fn from_config(cfg: &MtrConfig) -> anyhow::Result<Self> {
        let store = cache::open_store(cfg).await?;
        let pipeline = ResolutionPipeline::new(
            ChromeLauncher::new(LaunchOptions::from_config(&cfg.browser)),
            PlaybackSynchronizer::from_config(cfg),
            cfg.matching.to_rule(),
            SessionLimiter::new(cfg.max_browser_sessions),
        );
        Ok(TokenResolver::new(
            pipeline,
            ResolutionCache::with_ttl(store, cfg.cache_ttl()),
        ))
    }
}
