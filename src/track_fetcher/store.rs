/*!
 * Track stores keyed by (content id, language).
 *
 * An empty stored track is a valid entry: it records that the source has
 * no subtitles for that key.
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::database::Repository;
use crate::database::models::TrackRecord;
use crate::file_utils::FileManager;

#[async_trait]
pub trait TrackStore: Send + Sync {
    async fn get(&self, content_id: &str, lang: &str) -> Result<Option<String>>;

    async fn put(&self, content_id: &str, lang: &str, content: &str) -> Result<()>;

    /// Take ownership of a freshly downloaded file and return its content
    async fn put_artifact(&self, content_id: &str, lang: &str, artifact: &Path) -> Result<String> {
        let content = tokio::fs::read_to_string(artifact)
            .await
            .with_context(|| format!("Failed to read downloaded track {:?}", artifact))?;
        self.put(content_id, lang, &content).await?;
        Ok(content)
    }
}

/// One `<id>.<lang>.vtt` file per track under a cache directory
#[derive(Debug, Clone)]
pub struct FileTrackStore {
    dir: PathBuf,
}

impl FileTrackStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn track_path(&self, content_id: &str, lang: &str) -> PathBuf {
        self.dir.join(format!("{}.{}.vtt", content_id, lang))
    }
}

#[async_trait]
impl TrackStore for FileTrackStore {
    async fn get(&self, content_id: &str, lang: &str) -> Result<Option<String>> {
        let path = self.track_path(content_id, lang);
        tokio::task::spawn_blocking(move || FileManager::read_if_exists(&path)).await?
    }

    async fn put(&self, content_id: &str, lang: &str, content: &str) -> Result<()> {
        let path = self.track_path(content_id, lang);
        let content = content.to_string();
        tokio::task::spawn_blocking(move || FileManager::write_atomic(&path, &content)).await?
    }

    async fn put_artifact(&self, content_id: &str, lang: &str, artifact: &Path) -> Result<String> {
        let content = tokio::fs::read_to_string(artifact)
            .await
            .with_context(|| format!("Failed to read downloaded track {:?}", artifact))?;

        let from = artifact.to_path_buf();
        let to = self.track_path(content_id, lang);
        tokio::task::spawn_blocking(move || FileManager::move_file(&from, &to)).await??;

        Ok(content)
    }
}

/// Tracks stored in the `track_cache` table
#[derive(Clone)]
pub struct SqliteTrackStore {
    repo: Repository,
}

impl SqliteTrackStore {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl TrackStore for SqliteTrackStore {
    async fn get(&self, content_id: &str, lang: &str) -> Result<Option<String>> {
        Ok(self.repo.get_track(content_id, lang).await?.map(|record| record.content))
    }

    async fn put(&self, content_id: &str, lang: &str, content: &str) -> Result<()> {
        let record = TrackRecord::new(content_id.to_string(), lang.to_string(), content.to_string());
        self.repo.upsert_track(&record).await
    }
}

/// Process-local store, mostly for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryTrackStore {
    tracks: Arc<RwLock<HashMap<(String, String), String>>>,
}

impl MemoryTrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tracks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.read().is_empty()
    }
}

#[async_trait]
impl TrackStore for MemoryTrackStore {
    async fn get(&self, content_id: &str, lang: &str) -> Result<Option<String>> {
        let key = (content_id.to_string(), lang.to_string());
        Ok(self.tracks.read().get(&key).cloned())
    }

    async fn put(&self, content_id: &str, lang: &str, content: &str) -> Result<()> {
        self.tracks
            .write()
            .insert((content_id.to_string(), lang.to_string()), content.to_string());
        Ok(())
    }
}
