//! Resolver socket used by `mtr serve`.
//! Protocol: one embed URL per line in, one JSON line out: `{"mediaUrl":...}` or `{"error":"..."}`.

use anyhow::Result;
use mtr_core::{MediaResolver, TokenResolver};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

use crate::cli::input::validate_embed_url;

/// Longest accepted request line. A longer line gets an error reply and the connection is closed.
const MAX_LINE_BYTES: usize = 8 * 1024;

/// `~/.local/state/mtr/mtr.sock`
pub fn default_socket_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mtr")?;
    Ok(xdg_dirs.get_state_home().join("mtr.sock"))
}

/// Binds `path`, replacing a stale socket file left by a previous run.
pub fn bind(path: &Path) -> Result<UnixListener> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = std::fs::remove_file(path);
    let listener = UnixListener::bind(path)
        .map_err(|e| anyhow::anyhow!("bind {}: {}", path.display(), e))?;
    Ok(listener)
}

/// Accepts connections forever; each connection gets its own task so one slow
/// resolution does not hold up other clients.
pub async fn serve<R>(listener: UnixListener, resolver: Arc<TokenResolver<R>>)
where
    R: MediaResolver + 'static,
{
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let resolver = Arc::clone(&resolver);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, resolver).await {
                        tracing::debug!("socket connection ended: {}", e);
                    }
                });
            }
            Err(e) => tracing::debug!("socket accept: {}", e),
        }
    }
}

async fn handle_connection<R: MediaResolver>(
    stream: UnixStream,
    resolver: Arc<TokenResolver<R>>,
) -> Result<()> {
    let (read, mut write) = stream.into_split();
    let mut lines = FramedRead::new(read, LinesCodec::new_with_max_length(MAX_LINE_BYTES));
    while let Some(line) = lines.next().await {
        let (reply, keep_open) = match line {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => (respond(&resolver, &line).await?, true),
            // The framed stream ends after a decode error, so the connection does too.
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                tracing::debug!("socket request over {} bytes rejected", MAX_LINE_BYTES);
                (error_line("request line too long"), false)
            }
            Err(LinesCodecError::Io(e)) => return Err(e.into()),
        };
        write.write_all(reply.as_bytes()).await?;
        write.write_all(b"\n").await?;
        if !keep_open {
            break;
        }
    }
    Ok(())
}

fn error_line(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

async fn respond<R: MediaResolver>(resolver: &TokenResolver<R>, line: &str) -> Result<String> {
    match validate_embed_url(line) {
        Ok(embed_url) => {
            let resolution = resolver.resolve_token(embed_url).await;
            Ok(serde_json::to_string(&resolution)?)
        }
        Err(e) => {
            tracing::debug!(line, "rejected socket request: {}", e);
            Ok(error_line(&e.to_string()))
        }
    }
}
