//! Content-addressed response cache
//!
//! Every agent response is stored under a key derived from the project, the
//! agent kind and a SHA-256 digest of the exact prompt, so identical calls are
//! answered without touching the generation backend.
//!
//! # Architecture
//!
//! - `memory`: process-local map with per-entry expiry
//! - `sqlite`: SQLite table shared across runs
//! - `null`: degraded mode, always misses
//!
//! Caching is an optimisation, never a correctness requirement: callers go
//! through [`best_effort_get`] / [`best_effort_set`], which log and swallow
//! backend failures.

mod memory;
mod null;
mod sqlite;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::agents::AgentKind;
use crate::config::{CacheBackend, CacheConfig};
use crate::error::Result;
use crate::project::ProjectId;

pub use memory::MemoryCache;
pub use null::NullCache;
pub use sqlite::SqliteCache;

/// Key/value store with per-entry TTL
///
/// Implementations must tolerate concurrent reads and writes to distinct keys.
/// Writes replace the whole value; there is no in-place mutation.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Fetch a live value; `None` if the key was never written or has expired
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Insert or replace `key`, expiring after `ttl`
    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()>;

    /// Check that the backing store is reachable
    async fn ping(&self) -> Result<()>;

    /// Release backend resources
    async fn close(&self) {}

    /// Backend name for logs and health reports
    fn backend(&self) -> &'static str;
}

/// Compute the SHA-256 hex digest of a prompt
pub fn prompt_digest(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Key layout and lifetimes for cache entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    /// First key segment (namespace)
    pub root: String,
    /// Lifetime of per-agent envelopes
    pub agent_ttl: Duration,
    /// Lifetime of project aggregates
    pub aggregate_ttl: Duration,
}

impl Default for CacheKeys {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

impl CacheKeys {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            root: config.root.clone(),
            agent_ttl: config.agent_ttl(),
            aggregate_ttl: config.aggregate_ttl(),
        }
    }

    /// `{root}:{project_id}:{agent}:{sha256(prompt)}`
    pub fn agent_key(&self, project_id: &ProjectId, agent: AgentKind, prompt: &str) -> String {
        format!(
            "{}:{}:{}:{}",
            self.root,
            project_id,
            agent,
            prompt_digest(prompt)
        )
    }

    /// `{root}:{project_id}:aggregate`
    pub fn aggregate_key(&self, project_id: &ProjectId) -> String {
        format!("{}:{}:aggregate", self.root, project_id)
    }
}

/// Open the configured backend, degrading to [`NullCache`] if it is unreachable
pub async fn connect(config: &CacheConfig) -> Arc<dyn Cache> {
    match config.backend {
        CacheBackend::Disabled => {
            info!("Response caching disabled");
            Arc::new(NullCache)
        }
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
        CacheBackend::Sqlite => {
            let path = match config.resolved_path() {
                Ok(path) => path,
                Err(e) => {
                    warn!(error = %e, "Cache path unavailable, running without caching");
                    return Arc::new(NullCache);
                }
            };

            match SqliteCache::open(&path).await {
                Ok(cache) => match cache.ping().await {
                    Ok(()) => {
                        info!(path = %path.display(), "Cache connection successful");
                        Arc::new(cache)
                    }
                    Err(e) => {
                        warn!(error = %e, "Cache ping failed, running without caching");
                        cache.close().await;
                        Arc::new(NullCache)
                    }
                },
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Cache connection failed, running without caching"
                    );
                    Arc::new(NullCache)
                }
            }
        }
    }
}

/// Read `key`, treating backend errors as a miss
pub async fn best_effort_get(cache: &dyn Cache, key: &str) -> Option<Value> {
    match cache.get(key).await {
        Ok(Some(value)) => {
            debug!(key = %key, "Cache hit");
            Some(value)
        }
        Ok(None) => {
            debug!(key = %key, "Cache miss");
            None
        }
        Err(e) => {
            warn!(
                key = %key,
                backend = cache.backend(),
                error = %e,
                "Cache read failed, treating as miss"
            );
            None
        }
    }
}

/// Write `key`, logging and swallowing backend errors
///
/// Returns whether the write landed.
pub async fn best_effort_set(cache: &dyn Cache, key: &str, value: &Value, ttl: Duration) -> bool {
    match cache.set(key, value, ttl).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                key = %key,
                backend = cache.backend(),
                error = %e,
                "Cache write failed, continuing without caching"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    fn project() -> ProjectId {
        ProjectId::derive("Recipe Bot", "helps find recipes from ingredients")
    }

    #[test]
    fn test_prompt_digest_is_sha256_hex() {
        let digest = prompt_digest("hello");
        assert_eq!(digest.len(), 64);
        assert_eq!(
            digest,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_agent_key_layout() {
        let keys = CacheKeys::default();
        let id = project();
        let key = keys.agent_key(&id, AgentKind::Ideation, "prompt");

        let parts: Vec<&str> = key.split(':').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "hackmate");
        assert_eq!(parts[1], id.as_str());
        assert_eq!(parts[2], "ideation");
        assert_eq!(parts[3], prompt_digest("prompt"));
    }

    #[test]
    fn test_agent_key_deterministic() {
        let keys = CacheKeys::default();
        let id = project();
        assert_eq!(
            keys.agent_key(&id, AgentKind::Coding, "same prompt"),
            keys.agent_key(&id, AgentKind::Coding, "same prompt")
        );
    }

    #[test]
    fn test_agent_key_single_char_difference() {
        let keys = CacheKeys::default();
        let id = project();
        assert_ne!(
            keys.agent_key(&id, AgentKind::Coding, "prompt a"),
            keys.agent_key(&id, AgentKind::Coding, "prompt b")
        );
    }

    #[test]
    fn test_agent_key_differs_by_kind() {
        let keys = CacheKeys::default();
        let id = project();
        assert_ne!(
            keys.agent_key(&id, AgentKind::Planner, "p"),
            keys.agent_key(&id, AgentKind::Planning, "p")
        );
    }

    #[test]
    fn test_aggregate_key() {
        let keys = CacheKeys::default();
        let id = project();
        assert_eq!(
            keys.aggregate_key(&id),
            format!("hackmate:{}:aggregate", id)
        );
    }

    #[test]
    fn test_cache_keys_from_config() {
        let config = CacheConfig {
            root: "custom".to_string(),
            agent_ttl_secs: 5,
            aggregate_ttl_secs: 10,
            ..CacheConfig::default()
        };
        let keys = CacheKeys::from_config(&config);
        assert_eq!(keys.root, "custom");
        assert_eq!(keys.agent_ttl, Duration::from_secs(5));
        assert_eq!(keys.aggregate_ttl, Duration::from_secs(10));
    }

    struct BrokenCache;

    #[async_trait]
    impl Cache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<Value>> {
            Err(Error::Cache("connection reset".into()))
        }

        async fn set(&self, _key: &str, _value: &Value, _ttl: Duration) -> Result<()> {
            Err(Error::Cache("connection reset".into()))
        }

        async fn ping(&self) -> Result<()> {
            Err(Error::Cache("connection reset".into()))
        }

        fn backend(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_best_effort_swallows_errors() {
        let cache = BrokenCache;
        assert!(best_effort_get(&cache, "k").await.is_none());
        assert!(!best_effort_set(&cache, "k", &json!(1), Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_connect_disabled() {
        let config = CacheConfig {
            backend: CacheBackend::Disabled,
            ..CacheConfig::default()
        };
        let cache = connect(&config).await;
        assert_eq!(cache.backend(), "null");
    }

    #[tokio::test]
    async fn test_connect_memory() {
        let config = CacheConfig {
            backend: CacheBackend::Memory,
            ..CacheConfig::default()
        };
        let cache = connect(&config).await;
        assert_eq!(cache.backend(), "memory");
    }

    #[tokio::test]
    async fn test_connect_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let config = CacheConfig {
            path: Some(dir.path().join("cache.db")),
            ..CacheConfig::default()
        };
        let cache = connect(&config).await;
        assert_eq!(cache.backend(), "sqlite");
        cache.close().await;
    }

    #[tokio::test]
    async fn test_connect_unreachable_sqlite_degrades() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where a directory is expected makes the path unopenable
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let config = CacheConfig {
            path: Some(blocker.join("cache.db")),
            ..CacheConfig::default()
        };
        let cache = connect(&config).await;
        assert_eq!(cache.backend(), "null");
        assert!(cache.get("anything").await.unwrap().is_none());
    }
}
