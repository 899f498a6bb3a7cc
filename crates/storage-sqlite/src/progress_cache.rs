//! Durable key-value cache for progress records.
//!
//! One table, one row per cache key, the record stored as its JSON wire
//! form so the cache and the remote store stay interchangeable.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use stridequest_core::challenges::ProgressRecord;
use stridequest_core::sync::LocalProgressCache;

use crate::error::Result;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS progress_cache (
    key        TEXT PRIMARY KEY,
    payload    TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

/// SQLite-backed implementation of the local progress cache.
pub struct SqliteProgressCache {
    conn: Mutex<Connection>,
}

impl SqliteProgressCache {
    /// Open (or create) the cache database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// In-memory cache, used by tests and ephemeral sessions.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn read(&self, key: &str) -> Result<Option<ProgressRecord>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM progress_cache WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    fn write(&self, key: &str, record: &ProgressRecord) -> Result<()> {
        let payload = serde_json::to_string(record)?;
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT OR REPLACE INTO progress_cache (key, payload, updated_at)
             VALUES (?1, ?2, ?3)",
            params![key, payload, Utc::now().to_rfc3339()],
        )?;
        debug!("Cached progress record under key '{}'", key);
        Ok(())
    }

    fn wipe(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute("DELETE FROM progress_cache", [])?;
        Ok(())
    }
}

impl LocalProgressCache for SqliteProgressCache {
    fn get(&self, key: &str) -> stridequest_core::Result<Option<ProgressRecord>> {
        self.read(key).map_err(Into::into)
    }

    fn set(&self, key: &str, record: &ProgressRecord) -> stridequest_core::Result<()> {
        self.write(key, record).map_err(Into::into)
    }

    fn clear(&self) -> stridequest_core::Result<()> {
        self.wipe().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stridequest_core::challenges::ProgressSnapshot;

    fn record_with_gems(gems: i64) -> ProgressRecord {
        let mut snapshot = ProgressSnapshot::default_session();
        snapshot.cumulative_gems = gems;
        ProgressRecord::from(&snapshot)
    }

    #[test]
    fn absent_key_reads_as_none() {
        let cache = SqliteProgressCache::open_in_memory().unwrap();
        assert!(cache.get("progress::nobody").unwrap().is_none());
    }

    #[test]
    fn set_then_get_round_trips_the_record() {
        let cache = SqliteProgressCache::open_in_memory().unwrap();
        let record = record_with_gems(30);
        cache.set("progress::u1", &record).unwrap();

        let loaded = cache.get("progress::u1").unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn set_replaces_the_previous_record() {
        let cache = SqliteProgressCache::open_in_memory().unwrap();
        cache.set("progress::u1", &record_with_gems(10)).unwrap();
        cache.set("progress::u1", &record_with_gems(20)).unwrap();

        let loaded = cache.get("progress::u1").unwrap().unwrap();
        assert_eq!(loaded.gems, 20);
    }

    #[test]
    fn keys_are_independent() {
        let cache = SqliteProgressCache::open_in_memory().unwrap();
        cache.set("progress::u1", &record_with_gems(10)).unwrap();
        cache.set("progress::u2", &record_with_gems(50)).unwrap();

        assert_eq!(cache.get("progress::u1").unwrap().unwrap().gems, 10);
        assert_eq!(cache.get("progress::u2").unwrap().unwrap().gems, 50);
    }

    #[test]
    fn clear_removes_everything() {
        let cache = SqliteProgressCache::open_in_memory().unwrap();
        cache.set("progress::u1", &record_with_gems(10)).unwrap();
        cache.clear().unwrap();
        assert!(cache.get("progress::u1").unwrap().is_none());
    }
}
