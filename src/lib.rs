/*!
 * # kotonami
 *
 * Subtitle acquisition and Japanese word enrichment.
 *
 * ## Features
 *
 * - Download subtitle tracks through an external downloader, with retries
 *   on rate limiting and a cache of fetched (and missing) tracks
 * - Parse WebVTT into deduplicated cues with markup removed
 * - Annotate every word with reading, romaji, dictionary meaning and JLPT
 *   level, caching dictionary results
 *
 * ## Architecture
 *
 * - `track_fetcher`: track cache and downloader with retry policy
 * - `subtitle_processor`: WebVTT cue parser
 * - `analyzer`: tokenizer and phonetic conversion
 * - `dictionary`: remote dictionary client
 * - `cache`: word cache backends (memory, JSON file, SQLite)
 * - `database`: embedded SQLite store
 * - `enricher`: per-word enrichment
 * - `pipeline`: fetch → parse → enrich orchestration
 * - `app_config` / `app_controller`: configuration and wiring
 * - `errors`: error taxonomy
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod analyzer;
pub mod app_config;
pub mod app_controller;
pub mod cache;
pub mod database;
pub mod dictionary;
pub mod enricher;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod pipeline;
pub mod subtitle_processor;
pub mod track_fetcher;

// Re-export main types for easier usage
pub use app_config::Config;
pub use enricher::{WordEnricher, WordRecord};
pub use errors::{AnalyzerError, DictionaryError, EnrichError, FetchError, PipelineError};
pub use pipeline::{LineOutcome, Pipeline, ProcessedLine};
pub use subtitle_processor::{Cue, parse_vtt};
pub use track_fetcher::TrackFetcher;
