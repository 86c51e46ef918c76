use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;

use crate::dictionary::jisho::DEFAULT_ENDPOINT;
use crate::file_utils::FileManager;

/// Application configuration module
/// This module handles loading, validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Default track language (ISO)
    #[serde(default = "default_language")]
    pub language: String,

    /// Track download settings
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Dictionary service settings
    #[serde(default)]
    pub dictionary: DictionaryConfig,

    /// Word cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Tokenizer settings
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Where downloaded tracks are kept
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrackStoreKind {
    // @store: One VTT file per track in cache_dir
    #[default]
    File,
    // @store: track_cache table in the shared database
    Sqlite,
}

/// Word cache backend
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    // @backend: Process lifetime only
    Memory,
    // @backend: jisho_word_cache.json
    Json,
    // @backend: word_cache table
    #[default]
    Sqlite,
}

impl CacheBackend {
    pub fn display_name(&self) -> &str {
        match self {
            Self::Memory => "memory",
            Self::Json => "json",
            Self::Sqlite => "sqlite",
        }
    }
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for CacheBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(anyhow!("Invalid cache backend: {}", s)),
        }
    }
}

/// Tokenizer implementation
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    #[default]
    Mecab,
    Script,
}

/// Track download configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FetcherConfig {
    /// Downloader executable
    #[serde(default = "default_downloader_path")]
    pub downloader_path: String,

    /// Video page URL; `{id}` is replaced by the content id
    #[serde(default = "default_video_url_template")]
    pub video_url_template: String,

    /// Directory for the file track store and download scratch space
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    #[serde(default)]
    pub store: TrackStoreKind,

    /// Download attempts before giving up on rate limiting
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Attempt n waits n times this long first
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Per-attempt downloader timeout
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            downloader_path: default_downloader_path(),
            video_url_template: default_video_url_template(),
            cache_dir: default_cache_dir(),
            store: TrackStoreKind::default(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

/// Dictionary service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DictionaryConfig {
    /// Search endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause before every uncached lookup
    #[serde(default = "default_lookup_delay_ms")]
    pub lookup_delay_ms: u64,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            lookup_delay_ms: default_lookup_delay_ms(),
        }
    }
}

/// Word cache configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Cache file or database path; the user data directory when unset
    #[serde(default)]
    pub path: Option<String>,
}

/// Analyzer configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub kind: AnalyzerKind,

    #[serde(default = "default_mecab_path")]
    pub mecab_path: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            kind: AnalyzerKind::default(),
            mecab_path: default_mecab_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Log level for the application
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_language() -> String {
    "ja".to_string()
}

fn default_downloader_path() -> String {
    "yt-dlp".to_string()
}

fn default_video_url_template() -> String {
    "https://www.youtube.com/watch?v={id}".to_string()
}

fn default_cache_dir() -> String {
    "vtt_cache".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    5000
}

fn default_fetch_timeout_secs() -> u64 {
    120
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_user_agent() -> String {
    format!("kotonami/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_lookup_delay_ms() -> u64 {
    100 // courtesy pause between dictionary requests
}

fn default_mecab_path() -> String {
    "mecab".to_string()
}

impl Config {
    /// Load a config file, writing one with defaults if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match FileManager::read_if_exists(path)? {
            Some(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path)),
            None => {
                warn!("Config file not found at {:?}, creating default config.", path);
                let config = Config::default();
                config.save(path)?;
                Ok(config)
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        FileManager::write_atomic(path, &config_json)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::normalize_track_language(&self.language)
            .with_context(|| format!("Invalid default language: {}", self.language))?;

        if self.fetcher.max_attempts == 0 {
            return Err(anyhow!("fetcher.max_attempts must be at least 1"));
        }
        if !self.fetcher.video_url_template.contains("{id}") {
            return Err(anyhow!("fetcher.video_url_template must contain {{id}}"));
        }
        if self.fetcher.downloader_path.trim().is_empty() {
            return Err(anyhow!("fetcher.downloader_path is required"));
        }
        if self.dictionary.endpoint.trim().is_empty() {
            return Err(anyhow!("dictionary.endpoint is required"));
        }
        url::Url::parse(&self.dictionary.endpoint)
            .with_context(|| format!("Invalid dictionary endpoint: {}", self.dictionary.endpoint))?;
        if self.analyzer.kind == AnalyzerKind::Mecab && self.analyzer.mecab_path.trim().is_empty() {
            return Err(anyhow!("analyzer.mecab_path is required for the mecab analyzer"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            language: default_language(),
            fetcher: FetcherConfig::default(),
            dictionary: DictionaryConfig::default(),
            cache: CacheConfig::default(),
            analyzer: AnalyzerConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
