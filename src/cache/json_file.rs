/*!
 * Word cache persisted as a single JSON object.
 *
 * File format: `{ "<surface form>": { "meaning": "...", "jlpt": "..." } }`.
 * The file is read once when the cache is opened and rewritten atomically
 * after every `put`.
 */

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use tokio::sync::Mutex;

use super::{CacheEntry, MemoryWordCache, WordCache};
use crate::file_utils::FileManager;

/// Default file name for the JSON word cache
pub const DEFAULT_CACHE_FILE_NAME: &str = "jisho_word_cache.json";

pub struct JsonFileWordCache {
    path: PathBuf,
    entries: MemoryWordCache,
    /// Serializes flushes so an older snapshot never overwrites a newer one
    flush_lock: Mutex<()>,
}

impl JsonFileWordCache {
    /// Open the cache, loading existing entries.
    ///
    /// A missing file starts an empty cache. An unreadable or corrupt file
    /// also starts empty (with a warning) rather than failing startup; it is
    /// replaced on the first write.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = match FileManager::read_if_exists(&path) {
            Ok(Some(content)) => match serde_json::from_str::<HashMap<String, CacheEntry>>(&content) {
                Ok(map) => {
                    info!("Loaded {} words from cache {:?}", map.len(), path);
                    map
                }
                Err(e) => {
                    warn!("Word cache {:?} is not valid JSON, starting empty: {}", path, e);
                    HashMap::new()
                }
            },
            Ok(None) => {
                info!("Word cache file {:?} not found. Starting with empty cache.", path);
                HashMap::new()
            }
            Err(e) => {
                warn!("Error loading word cache {:?}, starting empty: {}", path, e);
                HashMap::new()
            }
        };

        Ok(Self {
            path,
            entries: MemoryWordCache::with_entries(entries),
            flush_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the current map to disk
    pub async fn flush(&self) -> Result<()> {
        let _guard = self.flush_lock.lock().await;

        // Sorted keys keep the file diff-friendly
        let snapshot: BTreeMap<String, CacheEntry> = self.entries.snapshot().into_iter().collect();
        let json = serde_json::to_string_pretty(&snapshot)
            .context("Failed to serialize word cache")?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || FileManager::write_atomic(&path, &json))
            .await
            .context("Word cache flush task panicked")?
    }
}

#[async_trait]
impl WordCache for JsonFileWordCache {
    async fn get(&self, surface_form: &str) -> Result<Option<CacheEntry>> {
        self.entries.get(surface_form).await
    }

    async fn put(&self, surface_form: &str, entry: &CacheEntry) -> Result<()> {
        self.entries.put(surface_form, entry).await?;
        self.flush()
            .await
            .with_context(|| format!("Failed to persist word cache to {:?}", self.path))
    }

    fn backend_name(&self) -> &'static str {
        "json"
    }
}
