use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use press_logging::press_info;
use tokio::io::AsyncWriteExt;

use crate::progress::JobReporter;
use crate::types::DownloadError;

/// Fixed emission thresholds within the 0-50% band reserved for downloading.
pub const DOWNLOAD_CHECKPOINTS: [u8; 6] = [0, 10, 20, 30, 40, 50];

/// Walks the checkpoint sequence against a running byte count. Each
/// checkpoint fires at most once, in increasing order, and nothing fires
/// past the final one.
#[derive(Debug)]
pub struct CheckpointTracker {
    next_index: usize,
}

impl CheckpointTracker {
    pub fn new() -> Self {
        // Index 0 is the baseline the stage reports on entry, not a
        // crossing to wait for.
        Self { next_index: 1 }
    }

    /// Returns the checkpoints newly crossed by `downloaded` of `total`
    /// bytes. An unknown total (0) never fires.
    pub fn advance(&mut self, downloaded: u64, total: u64) -> Vec<u8> {
        let mut fired = Vec::new();
        if total == 0 {
            return fired;
        }
        let percent = ((downloaded as f64 / total as f64) * 50.0) as u8;
        while self.next_index < DOWNLOAD_CHECKPOINTS.len()
            && percent >= DOWNLOAD_CHECKPOINTS[self.next_index]
        {
            fired.push(DOWNLOAD_CHECKPOINTS[self.next_index]);
            self.next_index += 1;
        }
        fired
    }

    pub fn exhausted(&self) -> bool {
        self.next_index == DOWNLOAD_CHECKPOINTS.len()
    }
}

impl Default for CheckpointTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub connect_timeout: Duration,
    /// Bound on each read from the body stream, not on the whole transfer.
    pub read_timeout: Duration,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
        }
    }
}

/// Streams a source document to local storage, reporting coarse progress.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Download `url` to `dest`, firing checkpoint progress through the
    /// reporter. Returns the number of bytes on disk at `dest`.
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        report: &mut JobReporter,
    ) -> Result<u64, DownloadError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestFetcher {
    settings: DownloadSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: DownloadSettings) -> Self {
        Self { settings }
    }

    async fn stream_to(
        &self,
        url: &str,
        dest: &Path,
        report: &mut JobReporter,
    ) -> Result<u64, DownloadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .read_timeout(self.settings.read_timeout)
            .build()
            .map_err(|err| DownloadError::Network(err.to_string()))?;

        let response = client.get(url).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus(status.as_u16()));
        }

        let total = response.content_length().unwrap_or(0);
        let mut file = tokio::fs::File::create(dest).await?;
        let mut tracker = CheckpointTracker::new();
        let mut downloaded: u64 = 0;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            for checkpoint in tracker.advance(downloaded, total) {
                report.downloading(f64::from(checkpoint));
            }
        }
        file.flush().await?;
        Ok(downloaded)
    }
}

#[async_trait]
impl SourceFetcher for ReqwestFetcher {
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        report: &mut JobReporter,
    ) -> Result<u64, DownloadError> {
        // Cache keyed on the derived filename: an existing download is
        // reused as-is and no checkpoints fire.
        if let Ok(meta) = tokio::fs::metadata(dest).await {
            press_info!("reusing cached download at {:?}", dest);
            return Ok(meta.len());
        }

        let result = self.stream_to(url, dest, report).await;
        if result.is_err() {
            // A partial file must not satisfy the cache on the next run.
            let _ = tokio::fs::remove_file(dest).await;
        }
        result
    }
}

fn map_reqwest_error(err: reqwest::Error) -> DownloadError {
    if err.is_timeout() {
        return DownloadError::Timeout(err.to_string());
    }
    DownloadError::Network(err.to_string())
}
