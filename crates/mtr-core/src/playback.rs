//! Brings a loaded embed page to the point where the player has issued its
//! media requests: wait for the media element, nudge playback, then settle.

use std::time::Duration;

use crate::browser::BrowserSession;
use crate::config::MtrConfig;
use crate::error::ResolveError;

#[derive(Debug, Clone)]
pub struct PlaybackSynchronizer {
    media_selector: String,
    wait_timeout: Duration,
    poll_interval: Duration,
    settle: Duration,
}

impl Default for PlaybackSynchronizer {
    fn default() -> Self {
        Self {
            media_selector: "video".to_string(),
            wait_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_millis(250),
            settle: Duration::from_secs(3),
        }
    }
}

impl PlaybackSynchronizer {
    pub fn from_config(cfg: &MtrConfig) -> Self {
        Self {
            media_selector: cfg.browser.media_selector.clone(),
            wait_timeout: cfg.media_wait(),
            poll_interval: cfg.poll_interval(),
            settle: cfg.settle(),
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn media_selector(&self) -> &str {
        &self.media_selector
    }

    /// Polls until the media element exists or the wait budget runs out.
    ///
    /// Probe errors while polling (e.g. the execution context being replaced
    /// mid-navigation) count as "not present yet".
    pub async fn wait_for_media_element(
        &self,
        session: &mut dyn BrowserSession,
    ) -> Result<(), ResolveError> {
        let selector = self.media_selector.as_str();
        let poll = async {
            loop {
                match session.has_element(selector).await {
                    Ok(true) => return,
                    Ok(false) => {}
                    Err(e) => tracing::trace!("media element probe failed: {}", e),
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };
        tokio::time::timeout(self.wait_timeout, poll)
            .await
            .map_err(|_| ResolveError::Timeout {
                selector: selector.to_string(),
                waited: self.wait_timeout,
            })
    }

    /// Asks the media element to start playing. Callers treat failure as non-fatal.
    pub async fn trigger_playback(
        &self,
        session: &mut dyn BrowserSession,
    ) -> Result<(), ResolveError> {
        session.run_script(&play_script(&self.media_selector)).await
    }

    /// Fixed wait for in-flight requests to reach the network log.
    pub async fn settle(&self) {
        tokio::time::sleep(self.settle).await;
    }

    /// Loaded → MediaElementPresent → Settled. Only the wait can fail.
    pub async fn run(&self, session: &mut dyn BrowserSession) -> Result<(), ResolveError> {
        self.wait_for_media_element(session).await?;
        tracing::debug!(selector = %self.media_selector, "media element present");
        if let Err(e) = self.trigger_playback(session).await {
            tracing::debug!("playback trigger ignored: {}", e);
        }
        self.settle().await;
        tracing::debug!(settle = ?self.settle, "settled");
        Ok(())
    }
}

/// Page script calling `play()` on the first element matching `selector`.
/// The returned promise is swallowed so autoplay rejections stay in the page.
fn play_script(selector: &str) -> String {
    let selector = serde_json::to_string(selector).unwrap_or_else(|_| "\"video\"".to_string());
    format!(
        "(() => {{ const el = document.querySelector({selector}); \
         if (!el) throw new Error('media element missing'); \
         const p = el.play(); if (p && p.catch) p.catch(() => {{}}); return true; }})()"
    )
}
