//! The tailer task

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[cfg(test)]
#[path = "tailer_test.rs"]
mod tailer_test;

/// Default interval between polling ticks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Tailer configuration
#[derive(Debug, Clone)]
pub struct TailConfig {
    /// File to follow
    pub path: PathBuf,

    /// Start from the current end of the file instead of the beginning
    pub from_end: bool,

    /// Keep following after the first complete scan pass
    pub follow: bool,

    /// Interval between polling ticks
    pub poll_interval: Duration,
}

impl TailConfig {
    /// Follow `path` forever from its current end
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            from_end: false,
            follow: true,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Follows a file through rotations, emitting completed lines on a channel
///
/// The channel closes when the tailer stops: after cancellation, after a
/// single pass when `follow` is off, or when the receiver goes away.
pub struct Tailer {
    config: TailConfig,
    out: mpsc::Sender<String>,
    cancel: CancellationToken,
}

impl Tailer {
    /// Create a tailer emitting lines on `out`
    pub fn new(config: TailConfig, out: mpsc::Sender<String>, cancel: CancellationToken) -> Self {
        Self {
            config,
            out,
            cancel,
        }
    }

    /// Run the tailer until cancellation or, without `follow`, until one
    /// scan pass completes
    ///
    /// Consumes the tailer; dropping it closes the output channel.
    pub async fn run(self) {
        let path = self.config.path.clone();
        info!(
            path = %path.display(),
            from_end = self.config.from_end,
            follow = self.config.follow,
            "tailer starting"
        );

        let mut offset: u64 = if self.config.from_end {
            match self.initial_end_offset().await {
                Some(offset) => offset,
                None => return,
            }
        } else {
            0
        };

        // last observed inode; zero means none observed yet
        let mut last_inode: u64 = 0;

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("shutting down by request");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let meta = match tokio::fs::metadata(&path).await {
                Ok(meta) => meta,
                Err(error) => {
                    warn!(path = %path.display(), %error, "failed to stat the file, will retry next tick");
                    continue;
                }
            };

            if meta.len() < offset {
                info!(
                    size = meta.len(),
                    offset, "file rotation detected by decreasing size, seeking to the beginning"
                );
                offset = 0;
            }

            #[cfg(unix)]
            {
                use std::os::unix::fs::MetadataExt;
                let inode = meta.ino();
                if inode != last_inode {
                    // the first observed inode is recorded without resetting
                    if last_inode != 0 {
                        info!(inode, "file rotation detected by inode change, seeking to the beginning");
                        offset = 0;
                    }
                    last_inode = inode;
                }
            }
            #[cfg(not(unix))]
            let _ = &mut last_inode;

            match self.scan_from(&path, offset).await {
                Some(new_offset) => offset = new_offset,
                // cancelled or receiver dropped mid-scan
                None => return,
            }

            if !self.config.follow {
                debug!("single pass complete, stopping");
                break;
            }
        }

        info!(path = %path.display(), "tailer stopped");
    }

    /// Open, seek, and emit every completed line past `offset`
    ///
    /// Returns the new offset, or `None` when the task should exit. The
    /// handle is dropped before returning so nothing stays open across
    /// ticks.
    async fn scan_from(&self, path: &Path, offset: u64) -> Option<u64> {
        let file = match File::open(path).await {
            Ok(file) => file,
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to open the file, will retry next tick");
                return Some(offset);
            }
        };

        let mut reader = BufReader::new(file);
        if let Err(error) = reader.seek(SeekFrom::Start(offset)).await {
            warn!(offset, %error, "failed to seek, restarting from the beginning");
            return Some(0);
        }

        let mut offset = offset;
        let mut scanned = 0usize;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = match reader.read_until(b'\n', &mut buf).await {
                Ok(read) => read,
                Err(error) => {
                    warn!(offset, %error, "read failed mid-scan, will retry next tick");
                    break;
                }
            };
            if read == 0 {
                break;
            }
            if buf.last() != Some(&b'\n') {
                // incomplete trailing line; leave it for the next tick
                break;
            }

            let mut line = &buf[..buf.len() - 1];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            let text = String::from_utf8_lossy(line).into_owned();

            if self.cancel.is_cancelled() {
                debug!("shutdown requested mid-scan, dropping remainder");
                return None;
            }
            if self.out.send(text).await.is_err() {
                debug!("line receiver dropped, stopping");
                return None;
            }

            offset += read as u64;
            scanned += 1;
        }

        debug!(lines = scanned, offset, "finished scanning file");
        Some(offset)
    }

    /// Wait for the file to exist and return its current size
    ///
    /// Returns `None` when cancelled while waiting.
    async fn initial_end_offset(&self) -> Option<u64> {
        loop {
            match tokio::fs::metadata(&self.config.path).await {
                Ok(meta) => {
                    debug!(offset = meta.len(), "moved to the end of the file");
                    return Some(meta.len());
                }
                Err(error) => {
                    warn!(
                        path = %self.config.path.display(),
                        %error,
                        "failed to stat the file while seeking to the end, will retry"
                    );
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return None,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }
}
