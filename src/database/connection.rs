/*!
 * Shared SQLite handle.
 *
 * One connection per database file, guarded by a mutex. Async callers go
 * through `execute_async`, which runs the closure on the blocking pool.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::Connection;

use super::schema;

const DATA_DIR_NAME: &str = "kotonami";
const DATABASE_FILE_NAME: &str = "kotonami.db";

#[derive(Clone)]
pub struct DatabaseConnection {
    /// Backing file; `None` for an in-memory database
    file: Option<PathBuf>,
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseConnection {
    /// Open (creating if needed) the database file and apply migrations
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let file = db_path.as_ref().to_path_buf();
        if let Some(dir) = file.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create database directory: {:?}", dir))?;
        }

        info!("Opening word and track cache database at {:?}", file);
        let conn = Connection::open(&file)
            .with_context(|| format!("Failed to open database: {:?}", file))?;

        Self::from_connection(conn, Some(file))
    }

    pub fn new_in_memory() -> Result<Self> {
        debug!("Opening in-memory cache database");
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, file: Option<PathBuf>) -> Result<Self> {
        schema::migrate(&conn)?;
        Ok(Self {
            file,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// `<user data dir>/kotonami/kotonami.db`
    pub fn default_database_path() -> Result<PathBuf> {
        let base = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .ok_or_else(|| anyhow!("No user data directory on this platform"))?;
        Ok(base.join(DATA_DIR_NAME).join(DATABASE_FILE_NAME))
    }

    pub fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        f(&self.connection.lock())
    }

    pub async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = self.connection.clone();
        tokio::task::spawn_blocking(move || f(&connection.lock()))
            .await
            .context("Database task panicked")?
    }

    /// Row counts for both caches plus the file size
    pub fn stats(&self) -> Result<DatabaseStats> {
        let (word_count, total_hits, track_count) = self.execute(|conn| {
            let counts = conn.query_row(
                "SELECT (SELECT COUNT(*) FROM word_cache),
                        (SELECT COALESCE(SUM(hit_count), 0) FROM word_cache),
                        (SELECT COUNT(*) FROM track_cache)",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;
            Ok(counts)
        })?;

        let file_size_bytes = self
            .file
            .as_ref()
            .and_then(|file| std::fs::metadata(file).ok())
            .map_or(0, |meta| meta.len());

        Ok(DatabaseStats {
            word_count,
            total_hits,
            track_count,
            file_size_bytes,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub word_count: i64,
    pub total_hits: i64,
    pub track_count: i64,
    pub file_size_bytes: u64,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Words: {}, Word hits: {}, Tracks: {}, Size: {} KB",
            self.word_count,
            self.total_hits,
            self.track_count,
            self.file_size_bytes / 1024
        )
    }
}
