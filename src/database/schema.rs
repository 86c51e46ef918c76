/*!
 * Schema migrations, tracked with SQLite's `user_version` pragma.
 *
 * `MIGRATIONS[i]` upgrades the database from version `i` to `i + 1`.
 * Append new steps; never edit an applied one.
 */

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use rusqlite::Connection;

const MIGRATIONS: &[&str] = &[
    // v1: word and track caches
    r#"
    CREATE TABLE IF NOT EXISTS word_cache (
        surface_form TEXT PRIMARY KEY,
        meaning TEXT NOT NULL,
        jlpt_level TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        hit_count INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS track_cache (
        content_id TEXT NOT NULL,
        lang TEXT NOT NULL,
        content TEXT NOT NULL,
        fetched_at TEXT NOT NULL,
        PRIMARY KEY (content_id, lang)
    );
    "#,
];

/// Latest schema version this build understands
pub fn latest_version() -> i64 {
    MIGRATIONS.len() as i64
}

fn user_version(conn: &Connection) -> Result<i64> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .context("Failed to read schema version")
}

/// Bring the database up to `latest_version()`
pub fn migrate(conn: &Connection) -> Result<()> {
    // Independent pipeline runs may read while another writes
    conn.execute_batch("PRAGMA journal_mode=WAL;")
        .context("Failed to set journal mode")?;

    let current = user_version(conn)?;
    let latest = latest_version();
    if current > latest {
        return Err(anyhow!(
            "Database schema v{} is newer than this build supports (v{})",
            current, latest
        ));
    }
    if current == latest {
        debug!("Database schema is current (v{})", current);
        return Ok(());
    }

    for (index, step) in MIGRATIONS.iter().enumerate().skip(current as usize) {
        let version = index as i64 + 1;
        info!("Applying database migration v{}", version);
        conn.execute_batch(step)
            .with_context(|| format!("Migration to v{} failed", version))?;
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(())
}
