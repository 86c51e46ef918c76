/*!
 * Common test utilities for the kotonami test suite
 *
 * Test doubles for the external capabilities so no test spawns a process
 * or makes a network request:
 * - `ScriptedDownloader`: replays a queue of downloader outcomes
 * - `StubAnalyzer`: whitespace tokenizer that fails on a marker word
 * Dictionary calls are counted with the crate's own `MockDictionary`.
 */

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use kotonami::analyzer::{MorphAnalyzer, kana};
use kotonami::cache::MemoryWordCache;
use kotonami::dictionary::MockDictionary;
use kotonami::enricher::WordEnricher;
use kotonami::errors::{AnalyzerError, FetchError};
use kotonami::pipeline::Pipeline;
use kotonami::track_fetcher::downloader::artifact_path;
use kotonami::track_fetcher::{DownloadOutput, Downloader, MemoryTrackStore, RetryPolicy, TrackFetcher};

/// Token that makes `StubAnalyzer::tokenize` fail
pub const FAILING_TOKEN: &str = "BOOM";

/// Route crate logs through the test harness; set RUST_LOG to see them
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    std::fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Build a WebVTT document from (start, end, text) triples
pub fn vtt(cues: &[(&str, &str, &str)]) -> String {
    let mut out = String::from("WEBVTT\nKind: captions\nLanguage: ja\n\n");
    for (start, end, text) in cues {
        out.push_str(&format!("{} --> {}\n{}\n\n", start, end, text));
    }
    out
}

/// Retry policy with short delays for tests
pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(5))
}

/// One scripted downloader run
#[derive(Debug, Clone)]
pub enum ScriptedRun {
    /// Exit 0 and write this track to the artifact path
    Track(String),
    /// Exit 0 with the "no subtitles" diagnostic
    NoSubtitles,
    /// Exit 1 with an HTTP 429 diagnostic
    RateLimited,
    /// Exit 1 with this diagnostic
    Fail(String),
    /// Exit 0 without writing anything
    SuccessWithoutArtifact,
    /// Write a partial artifact, then hang for this long before exiting 0
    Slow(Duration),
}

/// Downloader that replays scripted runs; the last run repeats forever
pub struct ScriptedDownloader {
    runs: Mutex<VecDeque<ScriptedRun>>,
    last: Mutex<Option<ScriptedRun>>,
    calls: Mutex<Vec<Instant>>,
    templates: Mutex<Vec<PathBuf>>,
}

impl ScriptedDownloader {
    pub fn new(runs: Vec<ScriptedRun>) -> Self {
        Self {
            runs: Mutex::new(runs.into()),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            templates: Mutex::new(Vec::new()),
        }
    }

    pub fn always(run: ScriptedRun) -> Self {
        Self::new(vec![run])
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// When each download started
    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().clone()
    }

    /// Output templates passed to each download
    pub fn templates(&self) -> Vec<PathBuf> {
        self.templates.lock().clone()
    }

    fn next_run(&self) -> ScriptedRun {
        let next = self.runs.lock().pop_front();
        let mut last = self.last.lock();
        match next {
            Some(run) => {
                *last = Some(run.clone());
                run
            }
            None => last.clone().unwrap_or(ScriptedRun::SuccessWithoutArtifact),
        }
    }
}

#[async_trait]
impl Downloader for ScriptedDownloader {
    async fn download(
        &self,
        _content_id: &str,
        lang: &str,
        output_template: &Path,
    ) -> Result<DownloadOutput, FetchError> {
        self.calls.lock().push(Instant::now());
        self.templates.lock().push(output_template.to_path_buf());

        let output = match self.next_run() {
            ScriptedRun::Track(content) => {
                std::fs::write(artifact_path(output_template, lang), content)
                    .map_err(|e| FetchError::Finalize(e.to_string()))?;
                DownloadOutput { success: true, ..Default::default() }
            }
            ScriptedRun::NoSubtitles => DownloadOutput {
                success: true,
                stderr: "[info] There are no subtitles for the requested languages".to_string(),
                ..Default::default()
            },
            ScriptedRun::RateLimited => DownloadOutput {
                success: false,
                stderr: "ERROR: Unable to download video subtitles: HTTP Error 429: Too Many Requests".to_string(),
                ..Default::default()
            },
            ScriptedRun::Fail(message) => DownloadOutput {
                success: false,
                stderr: message,
                ..Default::default()
            },
            ScriptedRun::SuccessWithoutArtifact => DownloadOutput { success: true, ..Default::default() },
            ScriptedRun::Slow(duration) => {
                std::fs::write(artifact_path(output_template, lang), "WEBVTT\n\n00:00:01.000 --> ")
                    .map_err(|e| FetchError::Finalize(e.to_string()))?;
                tokio::time::sleep(duration).await;
                DownloadOutput { success: true, ..Default::default() }
            }
        };

        Ok(output)
    }
}

/// Splits on whitespace; tokenizing text containing `FAILING_TOKEN` fails
#[derive(Debug, Default)]
pub struct StubAnalyzer;

#[async_trait]
impl MorphAnalyzer for StubAnalyzer {
    async fn tokenize(&self, text: &str) -> Result<Vec<String>, AnalyzerError> {
        if text.contains(FAILING_TOKEN) {
            return Err(AnalyzerError::Failed(format!("cannot tokenize '{}'", text)));
        }
        Ok(text.split_whitespace().map(str::to_string).collect())
    }

    async fn to_reading(&self, word: &str) -> Result<String, AnalyzerError> {
        Ok(kana::katakana_to_hiragana(word))
    }

    async fn to_romanized(&self, word: &str) -> Result<String, AnalyzerError> {
        Ok(kana::to_romaji(word))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Enricher over the stub analyzer with no lookup delay
pub fn stub_enricher(dictionary: &MockDictionary, cache: &MemoryWordCache) -> WordEnricher {
    WordEnricher::new(
        Arc::new(StubAnalyzer),
        Arc::new(dictionary.clone()),
        Arc::new(cache.clone()),
        Duration::ZERO,
    )
}

/// Pipeline over test doubles only
pub fn stub_pipeline(
    downloader: Arc<ScriptedDownloader>,
    store: &MemoryTrackStore,
    dictionary: &MockDictionary,
    cache: &MemoryWordCache,
    work_dir: &Path,
) -> Pipeline {
    let fetcher = TrackFetcher::new(downloader, Arc::new(store.clone()), fast_policy(3)).with_work_dir(work_dir);
    Pipeline::new(fetcher, stub_enricher(dictionary, cache))
}

/// Dictionary knowing a handful of common words
pub fn sample_dictionary() -> MockDictionary {
    MockDictionary::new()
        .with_word("猫", &["cat"], Some("jlpt-n5"))
        .with_word("犬", &["dog"], Some("jlpt-n5"))
        .with_word("好き", &["liked", "well-liked", "favourite"], Some("jlpt-n5"))
        .with_word("が", &["but", "however"], None)
}
