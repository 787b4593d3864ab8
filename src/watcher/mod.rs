//! Log watcher: tails the server log and emits parsed chat lines.
//!
//! Polling tail: starts at the current end of the file (old chatter is not
//! replayed), reads newly appended bytes each tick, resets on truncation or
//! rotation, and carries partial lines across ticks. Parsed lines that pass
//! duplicate suppression are handed to the bridge over an unbounded channel.

pub mod dedup;
pub mod parse;

pub use dedup::SeenWindow;
pub use parse::{parse_chat_line, ChatLine};

use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::WatcherConfig;

/// Polling log tail that publishes chat lines.
pub struct LogWatcher {
    path: PathBuf,
    poll_interval: Duration,
    offset: u64,
    partial: String,
    seen: SeenWindow,
}

impl LogWatcher {
    pub fn new(config: &WatcherConfig) -> Self {
        Self {
            path: config.log_path.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            offset: 0,
            partial: String::new(),
            seen: SeenWindow::new(config.dedup_window_secs),
        }
    }

    /// Run until the shutdown channel flips or the receiver is dropped.
    pub async fn watch(
        mut self,
        tx: mpsc::UnboundedSender<ChatLine>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        // Skip everything already in the log when we start.
        self.offset = tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        info!(path = %self.path.display(), "Watching chat log");

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Log watcher shutting down");
                        return;
                    }
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            if *shutdown_rx.borrow() {
                return;
            }

            let lines = match self.drain_new_lines().await {
                Ok(lines) => lines,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Log read failed");
                    continue;
                }
            };

            for line in lines {
                let Some(chat) = parse_chat_line(&line) else {
                    continue;
                };
                if !self.seen.observe(&chat.player, &chat.message, now_secs()) {
                    debug!(player = %chat.player, "Dropping duplicate chat line");
                    continue;
                }
                if tx.send(chat).is_err() {
                    warn!("Chat receiver dropped, stopping watcher");
                    return;
                }
            }
        }
    }

    /// Read bytes appended since the last poll and split them into complete
    /// lines; an unterminated final line is kept for the next tick.
    async fn drain_new_lines(&mut self) -> std::io::Result<Vec<String>> {
        let len = match tokio::fs::metadata(&self.path).await {
            Ok(m) => m.len(),
            // A rotated-away log will reappear; treat as empty meanwhile.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.offset = 0;
                self.partial.clear();
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        if len < self.offset {
            debug!(path = %self.path.display(), "Log truncated or rotated, restarting from the top");
            self.offset = 0;
            self.partial.clear();
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        let mut file = File::open(&self.path).await?;
        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut buf = Vec::with_capacity((len - self.offset) as usize);
        file.take(len - self.offset).read_to_end(&mut buf).await?;
        self.offset += buf.len() as u64;

        let mut text = std::mem::take(&mut self.partial);
        text.push_str(&String::from_utf8_lossy(&buf));

        let mut lines = Vec::new();
        while let Some(idx) = text.find('\n') {
            let line = text[..idx].trim_end_matches('\r').to_string();
            lines.push(line);
            text.drain(..=idx);
        }
        self.partial = text;
        Ok(lines)
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
