/*!
 * Word cache backed by the embedded SQLite database.
 */

use anyhow::Result;
use async_trait::async_trait;

use super::{CacheEntry, WordCache};
use crate::database::Repository;
use crate::database::models::WordCacheRecord;
use crate::database::repository::WordCacheStats;

#[derive(Clone)]
pub struct SqliteWordCache {
    repo: Repository,
}

impl SqliteWordCache {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn stats(&self) -> Result<WordCacheStats> {
        self.repo.get_word_stats().await
    }
}

#[async_trait]
impl WordCache for SqliteWordCache {
    async fn get(&self, surface_form: &str) -> Result<Option<CacheEntry>> {
        let record = self.repo.get_word(surface_form).await?;
        Ok(record.map(|r| CacheEntry::new(r.meaning, r.jlpt_level)))
    }

    async fn put(&self, surface_form: &str, entry: &CacheEntry) -> Result<()> {
        let record = WordCacheRecord::new(
            surface_form.to_string(),
            entry.meaning.clone(),
            entry.jlpt_level.clone(),
        );
        self.repo.upsert_word(&record).await
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
