use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::network::MatchRule;

/// Browser launch parameters (optional `[browser]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Explicit path to a Chrome/Chromium binary. If missing, the driver searches the usual locations.
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,
    /// Extra command-line flags appended after the fixed launch flags.
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// CSS selector identifying the media player element.
    #[serde(default = "default_media_selector")]
    pub media_selector: String,
}

fn default_media_selector() -> String {
    "video".to_string()
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            extra_args: Vec::new(),
            media_selector: default_media_selector(),
        }
    }
}

/// Token URL matching markers (optional `[matching]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Substrings marking a manifest or media file (any one must be present).
    pub media_markers: Vec<String>,
    /// Substrings marking a token or expiry query parameter (any one must be present).
    pub token_markers: Vec<String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        let rule = MatchRule::default();
        Self {
            media_markers: rule.media_markers,
            token_markers: rule.token_markers,
        }
    }
}

impl MatchingConfig {
    pub fn to_rule(&self) -> MatchRule {
        MatchRule {
            media_markers: self.media_markers.clone(),
            token_markers: self.token_markers.clone(),
        }
    }
}

/// Where resolved URLs are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// SQLite file under the XDG state dir; survives restarts.
    #[default]
    Sqlite,
    /// In-process map; lost when the process exits.
    Memory,
}

/// Global configuration loaded from `~/.config/mtr/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MtrConfig {
    /// Maximum number of browser sessions alive at the same time.
    pub max_browser_sessions: usize,
    /// How long to wait for the media element before giving up.
    pub media_wait_secs: u64,
    /// Fixed window after triggering playback for network requests to land in the log.
    pub settle_secs: u64,
    /// Poll period while waiting for the media element.
    pub poll_interval_ms: u64,
    /// Lifetime of a cached resolution.
    pub cache_ttl_secs: u64,
    #[serde(default)]
    pub cache_backend: CacheBackend,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
}

impl Default for MtrConfig {
    fn default() -> Self {
        Self {
            max_browser_sessions: 4,
            media_wait_secs: 15,
            settle_secs: 3,
            poll_interval_ms: 250,
            cache_ttl_secs: 3600,
            cache_backend: CacheBackend::default(),
            browser: BrowserConfig::default(),
            matching: MatchingConfig::default(),
        }
    }
}

impl MtrConfig {
    pub fn media_wait(&self) -> Duration {
        Duration::from_secs(self.media_wait_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mtr")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MtrConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MtrConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: MtrConfig = toml::from_str(&data)?;
    Ok(cfg)
}
