//! Chrome/Chromium sessions driven over the DevTools protocol (chromiumoxide).

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventRequestWillBeSent, EventResponseReceived,
};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::Page;
use futures::stream;
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use super::{BrowserSession, LaunchOptions, SessionFactory};
use crate::error::ResolveError;
use crate::network::{NetworkEvent, REQUEST_WILL_BE_SENT, RESPONSE_RECEIVED};

fn browser_err(e: impl std::fmt::Display) -> ResolveError {
    ResolveError::Browser(e.to_string())
}

/// Polls the CDP connection until it closes. Errors are per-message (e.g. an
/// event this chromiumoxide build cannot decode) and do not stop the loop.
/// Returns how many were seen.
async fn drive_handler<S, T, E>(events: &mut S) -> usize
where
    S: futures::Stream<Item = Result<T, E>> + Unpin,
    E: std::fmt::Display,
{
    let mut errors = 0;
    while let Some(event) = events.next().await {
        if let Err(e) = event {
            errors += 1;
            tracing::debug!("browser handler event error: {}", e);
        }
    }
    errors
}

/// Launches a fresh headless Chrome for every session.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    options: LaunchOptions,
}

impl ChromeLauncher {
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl SessionFactory for ChromeLauncher {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, ResolveError> {
        let session = ChromeSession::launch(&self.options).await?;
        Ok(Box::new(session))
    }
}

/// One Chrome process with a single page and a background task copying
/// network events into the session log.
pub struct ChromeSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: JoinHandle<()>,
    capture: Option<JoinHandle<()>>,
    log: Arc<Mutex<Vec<NetworkEvent>>>,
}

impl ChromeSession {
    /// Starts the browser and opens a blank page with network capture running.
    ///
    /// If anything after the process start fails, the process is torn down
    /// before the error is returned.
    pub async fn launch(options: &LaunchOptions) -> Result<Self, ResolveError> {
        let mut builder = CdpConfig::builder();
        if let Some(ref path) = options.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        for arg in options.launch_args() {
            builder = builder.arg(arg);
        }
        let config = builder.build().map_err(ResolveError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ResolveError::Launch(e.to_string()))?;
        let handler = tokio::spawn(async move {
            let errors = drive_handler(&mut handler).await;
            tracing::debug!(errors, "browser handler finished");
        });
        tracing::debug!("browser launched");

        let mut session = ChromeSession {
            browser: Some(browser),
            page: None,
            handler,
            capture: None,
            log: Arc::new(Mutex::new(Vec::new())),
        };
        if let Err(e) = session.attach().await {
            session.close().await;
            return Err(e);
        }
        Ok(session)
    }

    /// Opens the working page and subscribes to network events before any navigation.
    async fn attach(&mut self) -> Result<(), ResolveError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| browser_err("browser already closed"))?;
        let page = browser.new_page("about:blank").await.map_err(browser_err)?;
        page.execute(EnableParams::default())
            .await
            .map_err(browser_err)?;

        let responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(browser_err)?
            .map(|ev| {
                NetworkEvent::new(
                    RESPONSE_RECEIVED,
                    serde_json::to_value(&*ev).unwrap_or_default(),
                )
            });
        let requests = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(browser_err)?
            .map(|ev| {
                NetworkEvent::new(
                    REQUEST_WILL_BE_SENT,
                    serde_json::to_value(&*ev).unwrap_or_default(),
                )
            });

        let mut events = Box::pin(stream::select(responses, requests));
        let log = Arc::clone(&self.log);
        self.capture = Some(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Ok(mut log) = log.lock() {
                    log.push(event);
                }
            }
        }));
        self.page = Some(page);
        Ok(())
    }

    fn page(&self) -> Result<&Page, ResolveError> {
        self.page
            .as_ref()
            .ok_or_else(|| browser_err("session has no open page"))
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ResolveError> {
        self.page()?
            .execute(NavigateParams::new(url))
            .await
            .map_err(browser_err)?;
        tracing::debug!(url, "navigation issued");
        Ok(())
    }

    async fn has_element(&mut self, selector: &str) -> Result<bool, ResolveError> {
        let selector = serde_json::to_string(selector).map_err(browser_err)?;
        let script = format!("document.querySelector({selector}) !== null");
        self.page()?
            .evaluate(script)
            .await
            .map_err(browser_err)?
            .into_value::<bool>()
            .map_err(browser_err)
    }

    async fn run_script(&mut self, script: &str) -> Result<(), ResolveError> {
        self.page()?
            .evaluate(script)
            .await
            .map(|_| ())
            .map_err(browser_err)
    }

    async fn network_log(&mut self) -> Result<Vec<NetworkEvent>, ResolveError> {
        self.log
            .lock()
            .map(|log| log.clone())
            .map_err(|_| browser_err("network log lock poisoned"))
    }

    async fn close(&mut self) {
        if let Some(capture) = self.capture.take() {
            capture.abort();
        }
        self.page = None;
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::warn!("browser close failed, killing process: {}", e);
                if let Some(Err(e)) = browser.kill().await {
                    tracing::warn!("browser kill failed: {}", e);
                }
            }
            if let Err(e) = browser.wait().await {
                tracing::warn!("waiting for browser exit failed: {}", e);
            }
            tracing::debug!("browser closed");
        }
        self.handler.abort();
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Some(capture) = self.capture.take() {
            capture.abort();
        }
        self.handler.abort();
        if self.browser.is_some() {
            // chromiumoxide kills the child process when the Browser is dropped.
            tracing::warn!("browser session dropped without close");
        }
    }
}
