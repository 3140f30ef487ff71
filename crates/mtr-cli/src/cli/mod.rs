//! CLI for the MTR embed-page token resolver.

mod commands;
mod input;
mod socket;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use mtr_core::config;
use std::path::PathBuf;

use commands::{run_completions, run_purge_cache, run_resolve, run_scan_log, run_serve};

/// Top-level CLI for the MTR token resolver.
#[derive(Debug, Parser)]
#[command(name = "mtr")]
#[command(about = "MTR: resolve embed pages to token-bearing media URLs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Resolve one or more embed page URLs (concurrently, bounded by max_browser_sessions).
    Resolve {
        /// Embed page URLs (http/https), used verbatim.
        #[arg(required = true, value_name = "EMBED_URL")]
        urls: Vec<String>,
        /// Skip the cache read; a successful result is still cached.
        #[arg(long)]
        no_cache: bool,
    },

    /// Scan a captured network log (performance log dump, event array or HAR) without a browser.
    ScanLog {
        /// Path to the JSON log file.
        path: PathBuf,
    },

    /// Remove expired entries from the token cache.
    PurgeCache,

    /// Serve resolutions over a Unix socket: one embed URL per line, one JSON line back.
    Serve {
        /// Socket path (default: ~/.local/state/mtr/mtr.sock).
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Print shell completions.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if let CliCommand::Completions { shell } = cli.command {
            return run_completions(shell);
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Resolve { urls, no_cache } => run_resolve(&cfg, &urls, no_cache).await?,
            CliCommand::ScanLog { path } => run_scan_log(&cfg, &path)?,
            CliCommand::PurgeCache => run_purge_cache(&cfg).await?,
            CliCommand::Serve { socket } => run_serve(&cfg, socket).await?,
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
