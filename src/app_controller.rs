use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::analyzer::{MecabAnalyzer, MorphAnalyzer, ScriptAnalyzer};
use crate::app_config::{AnalyzerKind, CacheBackend, Config, TrackStoreKind};
use crate::cache::json_file::DEFAULT_CACHE_FILE_NAME;
use crate::cache::{JsonFileWordCache, MemoryWordCache, SqliteWordCache, WordCache};
use crate::database::{DatabaseConnection, Repository};
use crate::dictionary::JishoClient;
use crate::enricher::WordEnricher;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::pipeline::Pipeline;
use crate::subtitle_processor;
use crate::track_fetcher::{FileTrackStore, RetryPolicy, SqliteTrackStore, TrackFetcher, TrackStore, YtDlpDownloader};

// @module: Application controller wiring config to pipeline components

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Database file used by the sqlite word cache and track store
    pub fn database_path(&self) -> Result<PathBuf> {
        match (&self.config.cache.path, self.config.cache.backend) {
            (Some(path), CacheBackend::Sqlite) => Ok(PathBuf::from(path)),
            _ => DatabaseConnection::default_database_path(),
        }
    }

    /// File used by the JSON word cache
    pub fn json_cache_path(&self) -> Result<PathBuf> {
        if let (Some(path), CacheBackend::Json) = (&self.config.cache.path, self.config.cache.backend) {
            return Ok(PathBuf::from(path));
        }
        let db_path = DatabaseConnection::default_database_path()?;
        let dir = db_path.parent().ok_or_else(|| anyhow!("Invalid data directory: {:?}", db_path))?;
        Ok(dir.join(DEFAULT_CACHE_FILE_NAME))
    }

    fn needs_database(&self) -> bool {
        self.config.cache.backend == CacheBackend::Sqlite || self.config.fetcher.store == TrackStoreKind::Sqlite
    }

    fn open_repository(&self) -> Result<Option<Repository>> {
        if !self.needs_database() {
            return Ok(None);
        }
        let connection = DatabaseConnection::new(self.database_path()?)?;
        Ok(Some(Repository::new(connection)))
    }

    fn build_word_cache(&self, repo: Option<&Repository>) -> Result<Arc<dyn WordCache>> {
        let cache: Arc<dyn WordCache> = match (self.config.cache.backend, repo) {
            (CacheBackend::Memory, _) => Arc::new(MemoryWordCache::new()),
            (CacheBackend::Json, _) => Arc::new(JsonFileWordCache::open(self.json_cache_path()?)?),
            (CacheBackend::Sqlite, Some(repo)) => Arc::new(SqliteWordCache::new(repo.clone())),
            (CacheBackend::Sqlite, None) => return Err(anyhow!("sqlite cache requires a database")),
        };
        info!("Word cache backend: {}", cache.backend_name());
        Ok(cache)
    }

    fn build_track_store(&self, repo: Option<&Repository>) -> Result<Arc<dyn TrackStore>> {
        match (self.config.fetcher.store, repo) {
            (TrackStoreKind::File, _) => Ok(Arc::new(FileTrackStore::new(&self.config.fetcher.cache_dir))),
            (TrackStoreKind::Sqlite, Some(repo)) => Ok(Arc::new(SqliteTrackStore::new(repo.clone()))),
            (TrackStoreKind::Sqlite, None) => Err(anyhow!("sqlite track store requires a database")),
        }
    }

    fn build_analyzer(&self) -> Arc<dyn MorphAnalyzer> {
        let settings = &self.config.analyzer;
        match settings.kind {
            AnalyzerKind::Mecab => Arc::new(MecabAnalyzer::new(&settings.mecab_path, settings.timeout_secs)),
            AnalyzerKind::Script => Arc::new(ScriptAnalyzer::new()),
        }
    }

    fn build_enricher(&self, repo: Option<&Repository>) -> Result<WordEnricher> {
        let settings = &self.config.dictionary;
        let dictionary = JishoClient::new(&settings.endpoint, &settings.user_agent, settings.timeout_secs)?;

        Ok(WordEnricher::new(
            self.build_analyzer(),
            Arc::new(dictionary),
            self.build_word_cache(repo)?,
            Duration::from_millis(settings.lookup_delay_ms),
        ))
    }

    /// Wire every production component from the configuration
    pub fn build_pipeline(&self) -> Result<Pipeline> {
        let repo = self.open_repository()?;
        let settings = &self.config.fetcher;

        let downloader = YtDlpDownloader::new(
            &settings.downloader_path,
            &settings.video_url_template,
            settings.timeout_secs,
        );
        let policy = RetryPolicy::new(settings.max_attempts, Duration::from_millis(settings.base_delay_ms));
        let fetcher = TrackFetcher::new(Arc::new(downloader), self.build_track_store(repo.as_ref())?, policy)
            .with_work_dir(&settings.cache_dir);

        Ok(Pipeline::new(fetcher, self.build_enricher(repo.as_ref())?))
    }

    /// Fetch, parse and enrich one track, writing the lines as JSON
    pub async fn run_track(&self, content_id: &str, lang: Option<&str>, output: Option<&Path>) -> Result<()> {
        let start_time = std::time::Instant::now();
        let lang = lang.unwrap_or(&self.config.language);
        let pipeline = self.build_pipeline()?;

        let progress_bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        let lang_name = language_utils::get_language_name(lang).unwrap_or_else(|_| lang.to_string());
        progress_bar.set_message(format!("{} ({})", content_id, lang_name));

        let bar = progress_bar.clone();
        let result = pipeline
            .process_track_with_progress(content_id, lang, move |done, total| {
                bar.set_length(total as u64);
                bar.set_position(done as u64);
            })
            .await;
        progress_bar.finish_and_clear();
        let lines = result?;

        let failed = lines.iter().filter(|line| line.is_error()).count();
        let stats = pipeline.enricher().stats();
        info!(
            "Processed {} lines ({} failed) in {:.1}s: {} cache hits, {} dictionary lookups",
            lines.len(),
            failed,
            start_time.elapsed().as_secs_f64(),
            stats.cache_hits,
            stats.lookups()
        );
        if failed > 0 {
            warn!("{} lines could not be enriched and carry an error", failed);
        }

        write_json(&lines, output)
    }

    /// Enrich a sentence and print the words as JSON
    pub async fn run_text(&self, sentence: &str, output: Option<&Path>) -> Result<()> {
        let pipeline = self.build_pipeline()?;
        let words = pipeline.enrich_free_text(sentence).await?;
        write_json(&words, output)
    }

    /// Parse a local VTT file and print its cues as JSON
    pub fn run_parse(&self, vtt_file: &Path, output: Option<&Path>) -> Result<()> {
        let raw = FileManager::read_if_exists(vtt_file)?
            .ok_or_else(|| anyhow!("Input file does not exist: {:?}", vtt_file))?;
        let cues = subtitle_processor::parse_vtt(&raw);
        info!("Parsed {} cues from {:?}", cues.len(), vtt_file);
        write_json(&cues, output)
    }

    /// Print word cache statistics for the configured backend
    pub async fn run_cache_stats(&self) -> Result<()> {
        let backend = self.config.cache.backend;
        println!("Word cache backend: {}", backend);
        match backend {
            CacheBackend::Memory => {
                println!("  Not persisted, nothing to report");
            }
            CacheBackend::Json => {
                let path = self.json_cache_path()?;
                let cache = JsonFileWordCache::open(&path)?;
                println!("  File:    {}", path.display());
                println!("  Entries: {}", cache.len());
            }
            CacheBackend::Sqlite => {
                let connection = DatabaseConnection::new(self.database_path()?)?;
                let db_stats = connection.stats()?;
                let cache = SqliteWordCache::new(Repository::new(connection));
                let word_stats = cache.stats().await?;
                println!("  Entries: {}", word_stats.total_entries);
                println!("  Hits:    {}", word_stats.total_hits);
                println!("{}", db_stats);
            }
        }
        Ok(())
    }
}

/// Pretty JSON to a file, or to stdout when no file is given
pub fn write_json<T: Serialize + ?Sized>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    match output {
        Some(path) => {
            FileManager::write_atomic(path, &json)?;
            info!("Wrote {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
