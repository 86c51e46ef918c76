/*!
 * Enrichment cache: surface form -> dictionary data.
 *
 * The word enricher only talks to the `WordCache` trait. Three backends
 * implement it:
 * - `memory`: process-local map, lost on exit
 * - `json_file`: map loaded at construction and flushed after every write
 * - `sqlite`: rows in the embedded database
 *
 * Absence (`Ok(None)`) is distinct from an entry whose meaning is empty or
 * the not-found sentinel. Writes are last-write-wins per key.
 */

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod json_file;
pub mod sqlite;

pub use memory::MemoryWordCache;
pub use json_file::JsonFileWordCache;
pub use sqlite::SqliteWordCache;

/// Cached dictionary data for one surface form
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Joined definitions of the first sense, or the not-found sentinel
    pub meaning: String,

    /// First JLPT tag, empty when the word has none
    #[serde(rename = "jlpt", default)]
    pub jlpt_level: String,
}

impl CacheEntry {
    pub fn new(meaning: impl Into<String>, jlpt_level: impl Into<String>) -> Self {
        Self {
            meaning: meaning.into(),
            jlpt_level: jlpt_level.into(),
        }
    }
}

/// Key-value store for enrichment data
#[async_trait]
pub trait WordCache: Send + Sync {
    /// Look up a surface form; `Ok(None)` when it was never stored
    async fn get(&self, surface_form: &str) -> Result<Option<CacheEntry>>;

    /// Store an entry, replacing any previous value for the same key
    async fn put(&self, surface_form: &str, entry: &CacheEntry) -> Result<()>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}
