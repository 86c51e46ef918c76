/*!
 * Database models for the persistent caches.
 */

use serde::{Deserialize, Serialize};

/// Row of the `word_cache` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordCacheRecord {
    /// Surface form, the primary key
    pub surface_form: String,
    /// Joined English definitions or the not-found sentinel
    pub meaning: String,
    /// First JLPT tag, possibly empty
    pub jlpt_level: String,
    /// Creation timestamp
    pub created_at: String,
    /// Last write timestamp
    pub updated_at: String,
    /// Number of cache hits
    pub hit_count: i64,
}

impl WordCacheRecord {
    /// Create a new record stamped with the current time
    pub fn new(surface_form: String, meaning: String, jlpt_level: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            surface_form,
            meaning,
            jlpt_level,
            created_at: now.clone(),
            updated_at: now,
            hit_count: 0,
        }
    }
}

/// Row of the `track_cache` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    /// Content identifier
    pub content_id: String,
    /// Track language
    pub lang: String,
    /// Raw track text; empty means no track exists
    pub content: String,
    /// When the track was downloaded
    pub fetched_at: String,
}

impl TrackRecord {
    pub fn new(content_id: String, lang: String, content: String) -> Self {
        Self {
            content_id,
            lang,
            content,
            fetched_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
