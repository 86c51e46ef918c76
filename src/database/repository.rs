/*!
 * Repository layer for database operations.
 *
 * High-level, typed access to the word and track caches. All queries run
 * on the blocking pool so callers can await them from async code.
 */

use anyhow::Result;
use log::debug;
use rusqlite::{params, OptionalExtension};

use super::connection::DatabaseConnection;
use super::models::{TrackRecord, WordCacheRecord};

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    // =========================================================================
    // Word Cache Operations
    // =========================================================================

    /// Look up a cached word, counting the hit
    pub async fn get_word(&self, surface_form: &str) -> Result<Option<WordCacheRecord>> {
        let surface_form = surface_form.to_string();

        self.db
            .execute_async(move |conn| {
                let record = conn
                    .query_row(
                        r#"
                        SELECT surface_form, meaning, jlpt_level, created_at, updated_at, hit_count
                        FROM word_cache
                        WHERE surface_form = ?1
                        "#,
                        [&surface_form],
                        |row| {
                            Ok(WordCacheRecord {
                                surface_form: row.get(0)?,
                                meaning: row.get(1)?,
                                jlpt_level: row.get(2)?,
                                created_at: row.get(3)?,
                                updated_at: row.get(4)?,
                                hit_count: row.get(5)?,
                            })
                        },
                    )
                    .optional()?;

                if record.is_some() {
                    conn.execute(
                        "UPDATE word_cache SET hit_count = hit_count + 1 WHERE surface_form = ?1",
                        [&surface_form],
                    )?;
                    debug!("Word cache hit for '{}'", surface_form);
                }

                Ok(record)
            })
            .await
    }

    /// Insert or overwrite a cached word (last write wins)
    pub async fn upsert_word(&self, record: &WordCacheRecord) -> Result<()> {
        let record = record.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO word_cache (
                        surface_form, meaning, jlpt_level, created_at, updated_at, hit_count
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ON CONFLICT(surface_form) DO UPDATE SET
                        meaning = excluded.meaning,
                        jlpt_level = excluded.jlpt_level,
                        updated_at = excluded.updated_at
                    "#,
                    params![
                        record.surface_form,
                        record.meaning,
                        record.jlpt_level,
                        record.created_at,
                        record.updated_at,
                        record.hit_count,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Get word cache statistics
    pub async fn get_word_stats(&self) -> Result<WordCacheStats> {
        self.db
            .execute_async(|conn| {
                let total_entries: i64 = conn
                    .query_row("SELECT COUNT(*) FROM word_cache", [], |row| row.get(0))
                    .unwrap_or(0);

                let total_hits: i64 = conn
                    .query_row(
                        "SELECT COALESCE(SUM(hit_count), 0) FROM word_cache",
                        [],
                        |row| row.get(0),
                    )
                    .unwrap_or(0);

                Ok(WordCacheStats {
                    total_entries,
                    total_hits,
                })
            })
            .await
    }

    // =========================================================================
    // Track Cache Operations
    // =========================================================================

    /// Look up a cached track
    pub async fn get_track(&self, content_id: &str, lang: &str) -> Result<Option<TrackRecord>> {
        let content_id = content_id.to_string();
        let lang = lang.to_string();

        self.db
            .execute_async(move |conn| {
                let record = conn
                    .query_row(
                        r#"
                        SELECT content_id, lang, content, fetched_at
                        FROM track_cache
                        WHERE content_id = ?1 AND lang = ?2
                        "#,
                        params![content_id, lang],
                        |row| {
                            Ok(TrackRecord {
                                content_id: row.get(0)?,
                                lang: row.get(1)?,
                                content: row.get(2)?,
                                fetched_at: row.get(3)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(record)
            })
            .await
    }

    /// Insert or overwrite a cached track
    pub async fn upsert_track(&self, record: &TrackRecord) -> Result<()> {
        let record = record.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO track_cache (content_id, lang, content, fetched_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(content_id, lang) DO UPDATE SET
                        content = excluded.content,
                        fetched_at = excluded.fetched_at
                    "#,
                    params![record.content_id, record.lang, record.content, record.fetched_at],
                )?;
                Ok(())
            })
            .await
    }
}

/// Word cache statistics
#[derive(Debug, Clone)]
pub struct WordCacheStats {
    /// Total number of cache entries
    pub total_entries: i64,
    /// Total number of cache hits
    pub total_hits: i64,
}
