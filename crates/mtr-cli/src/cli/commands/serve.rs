//! `mtr serve` – long-running resolver behind a Unix socket.

use anyhow::Result;
use mtr_core::cache;
use mtr_core::config::MtrConfig;
use mtr_core::ChromeTokenResolver;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::socket;

pub async fn run_serve(cfg: &MtrConfig, socket_path: Option<PathBuf>) -> Result<()> {
    let path = match socket_path {
        Some(p) => p,
        None => socket::default_socket_path()?,
    };
    let resolver = Arc::new(ChromeTokenResolver::from_config(cfg).await?);
    let listener = socket::bind(&path)?;
    println!("Listening on {}", path.display());
    tracing::info!(path = %path.display(), sessions = cfg.max_browser_sessions, "serving");

    let purger = cache::spawn_purger(Arc::clone(resolver.cache().store()), cfg.cache_ttl());
    let server = tokio::spawn(socket::serve(listener, resolver));
    tokio::signal::ctrl_c().await?;
    server.abort();
    purger.abort();
    let _ = std::fs::remove_file(&path);
    tracing::info!("server stopped");
    Ok(())
}
