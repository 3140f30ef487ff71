//! `mtr purge-cache` – drop expired token cache entries.

use anyhow::Result;
use mtr_core::cache;
use mtr_core::config::MtrConfig;

pub async fn run_purge_cache(cfg: &MtrConfig) -> Result<()> {
    let store = cache::open_store(cfg).await?;
    let removed = store.purge_expired().await?;
    println!("Removed {removed} expired cache entr{}.", if removed == 1 { "y" } else { "ies" });
    Ok(())
}
