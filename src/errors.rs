/*!
 * Error types for the kotonami pipeline.
 *
 * Each stage of the pipeline has its own error enum, built with thiserror.
 * `PipelineError` wraps all of them and is what the orchestrator surfaces.
 * Every enum exposes `kind()` so failures can be logged with a stable tag.
 */

use thiserror::Error;

/// Errors raised while obtaining a raw subtitle track
#[derive(Error, Debug)]
pub enum FetchError {
    /// The content id or language failed validation before any download
    #[error("Invalid track request: {0}")]
    InvalidRequest(String),

    /// The downloader reported throttling; a later attempt may succeed
    #[error("Downloader was rate limited on attempt {attempt}")]
    RateLimited {
        /// 1-based attempt that hit the limit
        attempt: u32,
    },

    /// Every attempt ended with a rate-limit signal
    #[error("Downloader failed after {attempts} attempts for {content_id} ({lang})")]
    RetriesExhausted {
        /// Requested content id
        content_id: String,
        /// Requested language
        lang: String,
        /// Number of attempts consumed
        attempts: u32,
    },

    /// The downloader exited with an unrecognized failure
    #[error("Downloader failed for {content_id} ({lang}): {message}")]
    Downloader {
        /// Requested content id
        content_id: String,
        /// Requested language
        lang: String,
        /// Filtered diagnostic output
        message: String,
    },

    /// The downloader process could not be started
    #[error("Failed to start downloader: {0}")]
    Spawn(String),

    /// The downloader did not finish in time
    #[error("Downloader timed out after {0} seconds")]
    Timeout(u64),

    /// The downloaded artifact could not be located or moved into the store
    #[error("Failed to finalize downloaded track: {0}")]
    Finalize(String),

    /// The track store could not be read or written
    #[error("Track store error: {0}")]
    Store(String),
}

impl FetchError {
    /// Only throttling is worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::RateLimited { .. } => "rate_limited",
            Self::RetriesExhausted { .. } => "retries_exhausted",
            Self::Downloader { .. } => "downloader_failed",
            Self::Spawn(_) => "downloader_spawn",
            Self::Timeout(_) => "downloader_timeout",
            Self::Finalize(_) => "finalize_failed",
            Self::Store(_) => "track_store",
        }
    }
}

/// Errors that can occur when talking to the dictionary service
#[derive(Error, Debug)]
pub enum DictionaryError {
    /// Error when making the request fails
    #[error("Dictionary request failed: {0}")]
    RequestFailed(String),

    /// Error when the response body cannot be decoded
    #[error("Failed to parse dictionary response: {0}")]
    ParseError(String),

    /// Non-success status returned by the service
    #[error("Dictionary responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error body returned by the service
        message: String,
    },

    /// Error establishing the connection or waiting for the response
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The service throttled the request
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),
}

impl DictionaryError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestFailed(_) => "request_failed",
            Self::ParseError(_) => "malformed_body",
            Self::ApiError { .. } => "api_error",
            Self::ConnectionError(_) => "connection",
            Self::RateLimitExceeded(_) => "rate_limited",
        }
    }
}

/// Errors raised by the tokenizer / phonetic converter
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// The analyzer process could not be started
    #[error("Failed to start analyzer: {0}")]
    Spawn(String),

    /// The analyzer ran but reported a failure
    #[error("Analyzer failed: {0}")]
    Failed(String),

    /// The analyzer output could not be understood
    #[error("Unexpected analyzer output: {0}")]
    Parse(String),

    /// The analyzer did not finish in time
    #[error("Analyzer timed out after {0} seconds")]
    Timeout(u64),
}

/// Errors surfaced by the word enricher
#[derive(Error, Debug)]
pub enum EnrichError {
    /// Tokenizing or converting the text failed
    #[error("Analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),
}

impl EnrichError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Analyzer(_) => "analyzer",
        }
    }
}

/// Top-level error returned by the pipeline entry points
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The track could not be obtained
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Free-text enrichment failed
    #[error("Enrichment error: {0}")]
    Enrich(#[from] EnrichError),
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(e) => e.kind(),
            Self::Enrich(e) => e.kind(),
        }
    }
}
