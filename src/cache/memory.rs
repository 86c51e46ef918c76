/*!
 * In-process word cache.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use log::debug;

use super::{CacheEntry, WordCache};

/// Word cache held in memory; clones share the same storage
#[derive(Clone, Default)]
pub struct MemoryWordCache {
    /// Internal cache storage
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,

    /// Cache hit counter
    hits: Arc<AtomicUsize>,

    /// Cache miss counter
    misses: Arc<AtomicUsize>,
}

impl MemoryWordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache with existing entries
    pub fn with_entries(entries: HashMap<String, CacheEntry>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
            ..Self::default()
        }
    }

    /// Hits, misses and hit rate
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy of every entry, used by backends that persist the whole map
    pub fn snapshot(&self) -> HashMap<String, CacheEntry> {
        self.entries.read().clone()
    }
}

#[async_trait]
impl WordCache for MemoryWordCache {
    async fn get(&self, surface_form: &str) -> Result<Option<CacheEntry>> {
        let entry = self.entries.read().get(surface_form).cloned();

        if entry.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for '{}'", surface_form);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("Cache miss for '{}'", surface_form);
        }

        Ok(entry)
    }

    async fn put(&self, surface_form: &str, entry: &CacheEntry) -> Result<()> {
        self.entries
            .write()
            .insert(surface_form.to_string(), entry.clone());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
