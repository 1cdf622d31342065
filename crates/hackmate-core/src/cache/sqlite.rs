//! SQLite-backed cache
//!
//! One table, one row per key. Writes are `INSERT OR REPLACE`, so an entry is
//! always a complete value from a single writer (last write wins).

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::Cache;
use crate::error::{Error, Result};

/// Default maximum connections in the pool
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// SQL to create the cache table
pub const CREATE_CACHE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS cache_entries (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    expires_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cache_entries_expires ON cache_entries(expires_at);
"#;

/// Cache persisted in a SQLite database file
#[derive(Debug, Clone)]
pub struct SqliteCache {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteCache {
    /// Open (creating if needed) the cache database at `path`
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let connect_options =
            SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect_with(connect_options)
            .await?;

        let cache = Self {
            pool,
            path: path.to_path_buf(),
        };
        cache.init().await?;
        Ok(cache)
    }

    /// Open a private in-memory database (useful for testing)
    pub async fn in_memory() -> Result<Self> {
        // In-memory requires single connection
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let cache = Self {
            pool,
            path: PathBuf::from(":memory:"),
        };
        cache.init().await?;
        Ok(cache)
    }

    /// Initialize the database schema and drop rows left expired by earlier runs
    async fn init(&self) -> Result<()> {
        sqlx::raw_sql(CREATE_CACHE_TABLE_SQL)
            .execute(&self.pool)
            .await?;
        let purged = self.purge_expired().await?;
        debug!(path = %self.path.display(), purged, "Cache table initialized");
        Ok(())
    }

    /// Database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete every expired row, returning how many were removed
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at <= ?")
            .bind(now_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Cache for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT value FROM cache_entries WHERE key = ? AND expires_at > ?")
            .bind(key)
            .bind(now_millis())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("value")?;
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        let ttl_ms = i64::try_from(ttl.as_millis())
            .map_err(|_| Error::Cache(format!("TTL out of range: {:?}", ttl)))?;
        let serialized = serde_json::to_string(value)?;

        sqlx::query("INSERT OR REPLACE INTO cache_entries (key, value, expires_at) VALUES (?, ?, ?)")
            .bind(key)
            .bind(serialized)
            .bind(now_millis().saturating_add(ttl_ms))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
