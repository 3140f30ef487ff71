//! `mtr scan-log <path>` – run the token URL scanner over a captured log.

use anyhow::Result;
use mtr_core::config::MtrConfig;
use mtr_core::network::{self, import};
use mtr_core::TokenResolution;
use std::path::Path;

pub fn run_scan_log(cfg: &MtrConfig, path: &Path) -> Result<()> {
    let events = import::load_events(path)?;
    let rule = cfg.matching.to_rule();
    let resolution = match network::scan(&events, &rule) {
        Some(url) => TokenResolution::found(url),
        None => TokenResolution::not_found(),
    };
    tracing::info!(path = %path.display(), events = events.len(), found = resolution.is_found(), "scan-log");
    println!("{}", serde_json::to_string(&resolution)?);
    Ok(())
}
