/*!
 * Track fetching with a cache in front of an external downloader.
 *
 * - `downloader`: the subprocess capability and outcome classification
 * - `store`: where fetched tracks (and "no track" markers) are kept
 *
 * A fetch consults the store first. On a miss the downloader runs in a
 * fresh temporary directory per attempt; the directory is removed when the
 * attempt ends, including when the future is dropped mid-download.
 */

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use tempfile::TempDir;

use crate::errors::FetchError;
use crate::language_utils;

pub mod downloader;
pub mod store;

pub use downloader::{Downloader, DownloaderVerdict, DownloadOutput, YtDlpDownloader, classify_outcome};
pub use store::{FileTrackStore, MemoryTrackStore, SqliteTrackStore, TrackStore};

static CONTENT_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("Invalid content id regex")
});

/// Reject ids that could escape the argument template or the cache namespace
pub fn validate_content_id(content_id: &str) -> Result<(), FetchError> {
    if CONTENT_ID_REGEX.is_match(content_id) {
        Ok(())
    } else {
        Err(FetchError::InvalidRequest(format!("invalid content id '{}'", content_id)))
    }
}

/// Bounded retry schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, at least 1
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Sleep before the 1-based `attempt`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay * attempt.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(5000))
    }
}

pub struct TrackFetcher {
    downloader: Arc<dyn Downloader>,
    store: Arc<dyn TrackStore>,
    policy: RetryPolicy,
    /// Parent of the per-attempt scratch directories; system temp if unset
    work_dir: Option<PathBuf>,
}

impl TrackFetcher {
    pub fn new(downloader: Arc<dyn Downloader>, store: Arc<dyn TrackStore>, policy: RetryPolicy) -> Self {
        Self {
            downloader,
            store,
            policy,
            work_dir: None,
        }
    }

    /// Keep scratch directories on the same filesystem as the store
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(work_dir.into());
        self
    }

    /// Raw track text for `(content_id, lang)`; empty when no track exists
    pub async fn fetch_track(&self, content_id: &str, lang: &str) -> Result<String, FetchError> {
        validate_content_id(content_id)?;
        let lang = language_utils::normalize_track_language(lang)
            .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;

        let cached = self
            .store
            .get(content_id, &lang)
            .await
            .map_err(|e| FetchError::Store(e.to_string()))?;
        if let Some(content) = cached {
            info!("Track cache hit for {} ({}), {} bytes", content_id, lang, content.len());
            return Ok(content);
        }

        info!("Track cache miss for {} ({}), downloading", content_id, lang);
        self.download_with_retries(content_id, &lang).await
    }

    async fn download_with_retries(&self, content_id: &str, lang: &str) -> Result<String, FetchError> {
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            let delay = self.policy.delay_for_attempt(attempt);
            debug!("Attempt {}/{} for {} ({}) after {:?}", attempt, max_attempts, content_id, lang, delay);
            tokio::time::sleep(delay).await;

            match self.attempt_download(content_id, lang, attempt).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_retryable() => {
                    warn!("Attempt {}/{} for {} ({}) failed: {}", attempt, max_attempts, content_id, lang, e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(FetchError::RetriesExhausted {
            content_id: content_id.to_string(),
            lang: lang.to_string(),
            attempts: max_attempts,
        })
    }

    async fn attempt_download(&self, content_id: &str, lang: &str, attempt: u32) -> Result<String, FetchError> {
        let scratch = self.scratch_dir()?;
        let template = scratch.path().join(format!("{}_{}_temp", content_id, lang));

        let output = self.downloader.download(content_id, lang, &template).await?;

        match classify_outcome(output.success, &output.stderr) {
            DownloaderVerdict::Completed => {
                let artifact = downloader::artifact_path(&template, lang);
                if !artifact.is_file() {
                    return Err(FetchError::Finalize(format!(
                        "downloader reported success but {:?} was not produced",
                        artifact
                    )));
                }
                let content = self
                    .store
                    .put_artifact(content_id, lang, &artifact)
                    .await
                    .map_err(|e| FetchError::Finalize(e.to_string()))?;
                info!("Downloaded track for {} ({}), {} bytes", content_id, lang, content.len());
                Ok(content)
            }
            DownloaderVerdict::NoSubtitles => {
                info!("No subtitles exist for {} ({}), caching empty marker", content_id, lang);
                self.store
                    .put(content_id, lang, "")
                    .await
                    .map_err(|e| FetchError::Store(e.to_string()))?;
                Ok(String::new())
            }
            DownloaderVerdict::RateLimited => Err(FetchError::RateLimited { attempt }),
            DownloaderVerdict::Failed(message) => Err(FetchError::Downloader {
                content_id: content_id.to_string(),
                lang: lang.to_string(),
                message,
            }),
        }
    }

    fn scratch_dir(&self) -> Result<TempDir, FetchError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(".kotonami-download-");
        let result = match &self.work_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .map_err(|e| FetchError::Finalize(format!("Failed to create {:?}: {}", dir, e)))?;
                builder.tempdir_in(dir)
            }
            None => builder.tempdir(),
        };
        result.map_err(|e| FetchError::Finalize(format!("Failed to create scratch directory: {}", e)))
    }
}
