//! Health checks (`hackmate doctor`)

use serde::{Deserialize, Serialize};

use crate::cache::{Cache, SqliteCache};
use crate::config::{CacheBackend, CacheConfig, Config, LlmConfig};

/// Health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    pub message: Option<String>,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: Some(message.into()),
        }
    }
}

/// Ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Warning,
    Error,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Overall system health report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub checks: Vec<HealthCheck>,
    pub timestamp: String,
}

impl HealthReport {
    fn from_checks(checks: Vec<HealthCheck>) -> Self {
        let overall_status = checks
            .iter()
            .map(|check| check.status)
            .max()
            .unwrap_or(HealthStatus::Ok);
        Self {
            overall_status,
            checks,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Run all health checks
pub async fn doctor(config: &Config) -> HealthReport {
    HealthReport::from_checks(vec![
        check_config(config),
        check_api_key(&config.llm),
        check_cache(&config.cache).await,
    ])
}

fn check_config(config: &Config) -> HealthCheck {
    const NAME: &str = "Configuration";

    if let Err(e) = config.validate() {
        return HealthCheck::new(NAME, HealthStatus::Error, format!("Invalid: {e}"));
    }
    match Config::config_path() {
        Ok(path) if path.exists() => {
            HealthCheck::new(NAME, HealthStatus::Ok, format!("Found at {}", path.display()))
        }
        Ok(path) => HealthCheck::new(
            NAME,
            HealthStatus::Ok,
            format!("Not found at {} (using defaults)", path.display()),
        ),
        Err(e) => HealthCheck::new(NAME, HealthStatus::Warning, e.to_string()),
    }
}

fn check_api_key(llm: &LlmConfig) -> HealthCheck {
    const NAME: &str = "API Key";

    match llm.redacted_api_key() {
        Ok(Some(redacted)) => {
            HealthCheck::new(NAME, HealthStatus::Ok, format!("Found ({redacted})"))
        }
        Ok(None) => HealthCheck::new(
            NAME,
            HealthStatus::Error,
            "Not set. Export HACKMATE_API_KEY or GEMINI_API_KEY",
        ),
        Err(e) => HealthCheck::new(NAME, HealthStatus::Error, e.to_string()),
    }
}

async fn check_cache(config: &CacheConfig) -> HealthCheck {
    const NAME: &str = "Cache";

    match config.backend {
        CacheBackend::Disabled => HealthCheck::new(
            NAME,
            HealthStatus::Warning,
            "Disabled; every request calls the generation API",
        ),
        CacheBackend::Memory => HealthCheck::new(
            NAME,
            HealthStatus::Warning,
            "In-memory; `show` and `slides` cannot see projects from earlier runs",
        ),
        CacheBackend::Sqlite => {
            let path = match config.resolved_path() {
                Ok(path) => path,
                Err(e) => return HealthCheck::new(NAME, HealthStatus::Warning, e.to_string()),
            };
            match SqliteCache::open(&path).await {
                Ok(cache) => {
                    let result = cache.ping().await;
                    cache.close().await;
                    match result {
                        Ok(()) => HealthCheck::new(
                            NAME,
                            HealthStatus::Ok,
                            format!("SQLite at {}", path.display()),
                        ),
                        Err(e) => HealthCheck::new(
                            NAME,
                            HealthStatus::Warning,
                            format!("Ping failed ({e}); running without caching"),
                        ),
                    }
                }
                Err(e) => HealthCheck::new(
                    NAME,
                    HealthStatus::Warning,
                    format!(
                        "Cannot open {} ({e}); running without caching",
                        path.display()
                    ),
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn status_of(checks: &[HealthStatus]) -> HealthStatus {
        let checks = checks
            .iter()
            .map(|s| HealthCheck::new("x", *s, ""))
            .collect();
        HealthReport::from_checks(checks).overall_status
    }

    #[test]
    fn test_overall_is_worst() {
        assert_eq!(status_of(&[]), HealthStatus::Ok);
        assert_eq!(
            status_of(&[HealthStatus::Ok, HealthStatus::Warning]),
            HealthStatus::Warning
        );
        assert_eq!(
            status_of(&[HealthStatus::Error, HealthStatus::Warning, HealthStatus::Ok]),
            HealthStatus::Error
        );
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Warning).unwrap(),
            "\"warning\""
        );
    }

    #[test]
    fn test_stored_api_key_is_an_error() {
        let llm = LlmConfig {
            api_key: Some("sk-stored".to_string()),
            ..LlmConfig::default()
        };
        let check = check_api_key(&llm);
        assert_eq!(check.status, HealthStatus::Error);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let mut config = Config::default();
        config.llm.temperature = 5.0;
        assert_eq!(check_config(&config).status, HealthStatus::Error);
    }

    #[tokio::test]
    async fn test_cache_disabled_is_warning() {
        let config = CacheConfig {
            backend: CacheBackend::Disabled,
            ..CacheConfig::default()
        };
        assert_eq!(check_cache(&config).await.status, HealthStatus::Warning);
    }

    #[tokio::test]
    async fn test_cache_memory_is_warning() {
        let config = CacheConfig {
            backend: CacheBackend::Memory,
            ..CacheConfig::default()
        };
        let check = check_cache(&config).await;
        assert_eq!(check.status, HealthStatus::Warning);
        assert!(check.message.unwrap().contains("earlier runs"));
    }

    #[tokio::test]
    async fn test_cache_sqlite_ok() {
        let dir = TempDir::new().unwrap();
        let config = CacheConfig {
            path: Some(dir.path().join("cache.db")),
            ..CacheConfig::default()
        };
        assert_eq!(check_cache(&config).await.status, HealthStatus::Ok);
    }

    #[tokio::test]
    async fn test_cache_sqlite_unreachable_is_warning() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let config = CacheConfig {
            path: Some(blocker.join("cache.db")),
            ..CacheConfig::default()
        };
        assert_eq!(check_cache(&config).await.status, HealthStatus::Warning);
    }
}
