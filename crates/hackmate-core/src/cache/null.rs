//! Degraded-mode cache: every read misses, every write is dropped

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::Cache;
use crate::error::Result;

/// Cache used when no store is configured or reachable
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

#[async_trait]
impl Cache for NullCache {
    async fn get(&self, _key: &str) -> Result<Option<Value>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &Value, _ttl: Duration) -> Result<()> {
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_null_cache_never_hits() {
        let cache = NullCache;
        cache
            .set("k", &json!({"a": 1}), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(cache.get("k").await.unwrap().is_none());
        assert!(cache.ping().await.is_ok());
    }
}
