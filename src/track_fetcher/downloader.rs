/*!
 * External subtitle downloader.
 *
 * `YtDlpDownloader` runs yt-dlp as a subprocess. Its diagnostic output is
 * the only signal for "no subtitles" and "rate limited", so all string
 * matching on it is confined to `classify_outcome`.
 */

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use crate::errors::FetchError;

/// Marker yt-dlp prints when the site throttles us
pub const RATE_LIMIT_MARKER: &str = "HTTP Error 429";

/// Markers meaning the video has no track in the requested language
pub const NO_SUBTITLE_MARKERS: &[&str] = &[
    "No subtitles found",
    "No video formats found",
    "There are no subtitles for the requested languages",
];

/// Raw result of one downloader run
#[derive(Debug, Clone, Default)]
pub struct DownloadOutput {
    /// Whether the process exited with status 0
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// What a downloader run means for the fetcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloaderVerdict {
    /// Track artifact should exist
    Completed,
    /// Confirmed that no track exists
    NoSubtitles,
    /// Throttled; worth retrying
    RateLimited,
    /// Anything else, with the filtered diagnostic text
    Failed(String),
}

/// Classify a finished downloader run.
///
/// The no-subtitle markers win regardless of exit status, since yt-dlp exits
/// 0 when it simply had nothing to write. The rate-limit marker only counts
/// when the run failed.
pub fn classify_outcome(success: bool, stderr: &str) -> DownloaderVerdict {
    if NO_SUBTITLE_MARKERS.iter().any(|marker| stderr.contains(marker)) {
        return DownloaderVerdict::NoSubtitles;
    }
    if success {
        return DownloaderVerdict::Completed;
    }
    if stderr.contains(RATE_LIMIT_MARKER) {
        return DownloaderVerdict::RateLimited;
    }
    DownloaderVerdict::Failed(filter_diagnostics(stderr))
}

/// Drop progress and info chatter, keeping lines that explain a failure
pub fn filter_diagnostics(stderr: &str) -> String {
    let noise_prefixes = ["[youtube]", "[info]", "[download]", "[debug]", "WARNING:"];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown downloader error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}

/// Path of the track file produced for an output template
pub fn artifact_path(output_template: &Path, lang: &str) -> PathBuf {
    let mut name = output_template.as_os_str().to_os_string();
    name.push(format!(".{}.vtt", lang));
    PathBuf::from(name)
}

/// Subprocess that writes a subtitle track next to `output_template`
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Run one download; only failures to run the process are errors here
    async fn download(
        &self,
        content_id: &str,
        lang: &str,
        output_template: &Path,
    ) -> Result<DownloadOutput, FetchError>;
}

/// yt-dlp invoked with auto-generated subtitles only
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    program: String,
    video_url_template: String,
    timeout_secs: u64,
}

impl YtDlpDownloader {
    pub fn new(program: impl Into<String>, video_url_template: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            program: program.into(),
            video_url_template: video_url_template.into(),
            timeout_secs,
        }
    }

    pub fn video_url(&self, content_id: &str) -> String {
        self.video_url_template.replace("{id}", content_id)
    }

    /// Argument vector; passed directly to the process, never through a shell
    pub fn build_args(&self, content_id: &str, lang: &str, output_template: &Path) -> Vec<String> {
        vec![
            "--write-auto-sub".to_string(),
            "--skip-download".to_string(),
            "--sub-lang".to_string(),
            lang.to_string(),
            "--sub-format".to_string(),
            "vtt".to_string(),
            "--no-warnings".to_string(),
            "-o".to_string(),
            output_template.to_string_lossy().into_owned(),
            self.video_url(content_id),
        ]
    }
}

#[async_trait]
impl Downloader for YtDlpDownloader {
    async fn download(
        &self,
        content_id: &str,
        lang: &str,
        output_template: &Path,
    ) -> Result<DownloadOutput, FetchError> {
        let args = self.build_args(content_id, lang, output_template);
        debug!("Running {} {}", self.program, args.join(" "));

        let download_future = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let timeout_duration = Duration::from_secs(self.timeout_secs);
        let output = tokio::select! {
            result = download_future => {
                result.map_err(|e| FetchError::Spawn(format!("{}: {}", self.program, e)))?
            },
            _ = tokio::time::sleep(timeout_duration) => {
                return Err(FetchError::Timeout(self.timeout_secs));
            }
        };

        Ok(DownloadOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
