//! `mtr resolve <url>...` – resolve embed URLs, one JSON line per input.

use anyhow::Result;
use mtr_core::config::MtrConfig;
use mtr_core::{ChromeTokenResolver, TokenResolution};
use serde::Serialize;
use std::sync::Arc;

use crate::cli::input::validate_embed_url;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResolveLine<'a> {
    pub embed_url: &'a str,
    #[serde(flatten)]
    pub resolution: TokenResolution,
}

pub async fn run_resolve(cfg: &MtrConfig, urls: &[String], no_cache: bool) -> Result<()> {
    let urls = urls
        .iter()
        .map(|u| validate_embed_url(u).map(str::to_string))
        .collect::<Result<Vec<_>>>()?;

    let resolver = Arc::new(ChromeTokenResolver::from_config(cfg).await?);
    let mut join_set = tokio::task::JoinSet::new();
    for (index, url) in urls.iter().cloned().enumerate() {
        let resolver = Arc::clone(&resolver);
        join_set.spawn(async move {
            let resolution = if no_cache {
                resolver.resolve_uncached(&url, true).await
            } else {
                resolver.resolve_token(&url).await
            };
            (index, resolution)
        });
    }

    let mut results: Vec<Option<TokenResolution>> = vec![None; urls.len()];
    while let Some(res) = join_set.join_next().await {
        let (index, resolution) = res.map_err(|e| anyhow::anyhow!("resolve task join: {}", e))?;
        results[index] = Some(resolution);
    }

    let mut found = 0usize;
    for (url, resolution) in urls.iter().zip(results) {
        let resolution = resolution.unwrap_or_else(TokenResolution::not_found);
        if resolution.is_found() {
            found += 1;
        }
        let line = ResolveLine {
            embed_url: url,
            resolution,
        };
        println!("{}", serde_json::to_string(&line)?);
    }
    tracing::info!(requested = urls.len(), found, "resolve command finished");
    Ok(())
}
