//! Browser session lifecycle.
//!
//! A [`SessionFactory`] launches one disposable headless browser per resolution
//! attempt; the resulting [`BrowserSession`] navigates, answers DOM probes, runs
//! page scripts and hands back the network log captured since launch. The
//! pipeline owns the session and calls [`BrowserSession::close`] exactly once on
//! every exit path.

mod chrome;
mod limit;

use async_trait::async_trait;
use std::path::PathBuf;

use crate::config::BrowserConfig;
use crate::error::ResolveError;
use crate::network::NetworkEvent;

pub use chrome::{ChromeLauncher, ChromeSession};
pub use limit::{SessionLimiter, SessionPermit};

/// Flags every session is launched with (headless is the driver default).
pub const BASE_LAUNCH_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-notifications",
    "--disable-popup-blocking",
];

/// One live browser process with network capture enabled from launch.
#[async_trait]
pub trait BrowserSession: Send {
    /// Starts loading `url`. Returns once the navigation is issued, not when the page is loaded.
    async fn navigate(&mut self, url: &str) -> Result<(), ResolveError>;

    /// True if `selector` currently matches an element in the page.
    async fn has_element(&mut self, selector: &str) -> Result<bool, ResolveError>;

    /// Evaluates `script` in the page. The script's value is discarded.
    async fn run_script(&mut self, script: &str) -> Result<(), ResolveError>;

    /// Every network event captured since launch, in capture order.
    async fn network_log(&mut self) -> Result<Vec<NetworkEvent>, ResolveError>;

    /// Terminates the browser process. Failures are logged, never returned.
    async fn close(&mut self);
}

/// Launches browser sessions.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, ResolveError>;
}

/// Fixed launch configuration for [`ChromeLauncher`].
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub chrome_executable: Option<PathBuf>,
    pub extra_args: Vec<String>,
}

impl LaunchOptions {
    pub fn from_config(cfg: &BrowserConfig) -> Self {
        Self {
            chrome_executable: cfg.chrome_executable.clone(),
            extra_args: cfg.extra_args.clone(),
        }
    }

    /// Base flags followed by the configured extras.
    pub fn launch_args(&self) -> Vec<String> {
        BASE_LAUNCH_ARGS
            .iter()
            .map(|s| s.to_string())
            .chain(self.extra_args.iter().cloned())
            .collect()
    }
}
