//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Environment variables checked for the generation API key, in order
pub const API_KEY_ENV_VARS: [&str; 2] = ["HACKMATE_API_KEY", "GEMINI_API_KEY"];

/// Longest accepted cache TTL (one year)
pub const MAX_TTL_SECS: u64 = 365 * 24 * 3600;

/// HackMate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    #[serde(skip)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.7,
            top_p: 0.8,
            top_k: 10,
            max_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

/// Which store backs the response cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// SQLite file on disk, shared across runs
    #[default]
    Sqlite,
    /// Process-local map, lost on exit
    Memory,
    /// No caching at all
    Disabled,
}

impl CacheBackend {
    /// Whether cached projects are visible to later processes
    pub fn persists(self) -> bool {
        matches!(self, Self::Sqlite)
    }
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Memory => write!(f, "memory"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

impl FromStr for CacheBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            "disabled" | "none" => Ok(Self::Disabled),
            other => Err(anyhow!(
                "Invalid cache backend: {}. Valid options: sqlite, memory, disabled",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// SQLite file; defaults to `cache.db` next to the config file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// First segment of every cache key
    pub root: String,
    pub agent_ttl_secs: u64,
    pub aggregate_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Sqlite,
            path: None,
            root: "hackmate".to_string(),
            agent_ttl_secs: 3600,
            aggregate_ttl_secs: 24 * 3600,
        }
    }
}

impl CacheConfig {
    /// Resolve the SQLite path, falling back to the config directory
    pub fn resolved_path(&self) -> anyhow::Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Config::config_dir()?.join("cache.db")),
        }
    }

    pub fn agent_ttl(&self) -> Duration {
        Duration::from_secs(self.agent_ttl_secs)
    }

    pub fn aggregate_ttl(&self) -> Duration {
        Duration::from_secs(self.aggregate_ttl_secs)
    }
}

impl LlmConfig {
    pub fn resolved_api_key(&self) -> anyhow::Result<Option<String>> {
        self.enforce_env_only()?;

        Ok(API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| env::var(name).ok())
            .find(|key| !key.trim().is_empty()))
    }

    pub fn redacted_api_key(&self) -> anyhow::Result<Option<String>> {
        self.resolved_api_key().map(|opt| opt.map(|key| redact_key(&key)))
    }

    pub fn enforce_env_only(&self) -> anyhow::Result<()> {
        if self.api_key.is_some() {
            return Err(anyhow!(
                "API keys must be provided via environment variables, not stored in configuration"
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("HACKMATE_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("hackmate")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.llm.enforce_env_only()?;

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(anyhow!("Temperature must be between 0.0 and 2.0"));
        }
        if !(0.0..=1.0).contains(&self.llm.top_p) {
            return Err(anyhow!("top_p must be between 0.0 and 1.0"));
        }
        if self.llm.top_k == 0 {
            return Err(anyhow!("top_k must be at least 1"));
        }
        if self.llm.max_tokens == 0 {
            return Err(anyhow!("max_tokens must be at least 1"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be at least 1"));
        }
        if self.cache.root.is_empty() || self.cache.root.contains(':') {
            return Err(anyhow!("Cache root must be non-empty and must not contain ':'"));
        }
        check_ttl("agent_ttl_secs", self.cache.agent_ttl_secs)?;
        check_ttl("aggregate_ttl_secs", self.cache.aggregate_ttl_secs)?;
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            // LLM settings
            "llm.model" => Ok(self.llm.model.clone()),
            "llm.base_url" => Ok(self.llm.base_url.clone()),
            "llm.temperature" => Ok(self.llm.temperature.to_string()),
            "llm.top_p" => Ok(self.llm.top_p.to_string()),
            "llm.top_k" => Ok(self.llm.top_k.to_string()),
            "llm.max_tokens" => Ok(self.llm.max_tokens.to_string()),
            "llm.timeout_secs" => Ok(self.llm.timeout_secs.to_string()),

            // Cache settings
            "cache.backend" => Ok(self.cache.backend.to_string()),
            "cache.path" => Ok(self.cache.resolved_path()?.display().to_string()),
            "cache.root" => Ok(self.cache.root.clone()),
            "cache.agent_ttl_secs" => Ok(self.cache.agent_ttl_secs.to_string()),
            "cache.aggregate_ttl_secs" => Ok(self.cache.aggregate_ttl_secs.to_string()),

            // API key (special handling - show redacted)
            "llm.api_key" | "api_key" => match self.llm.redacted_api_key()? {
                Some(redacted) => Ok(redacted),
                None => Ok("(not set - use HACKMATE_API_KEY or GEMINI_API_KEY env var)".to_string()),
            },

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `hackmate config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            // LLM settings
            "llm.model" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("Model name must not be empty"));
                }
                self.llm.model = value.trim().to_string();
            }
            "llm.base_url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(anyhow!("Base URL must start with http:// or https://"));
                }
                self.llm.base_url = value.trim_end_matches('/').to_string();
            }
            "llm.temperature" => {
                let temp: f32 = value
                    .parse()
                    .with_context(|| format!("Invalid temperature value: {}", value))?;
                if !(0.0..=2.0).contains(&temp) {
                    return Err(anyhow!("Temperature must be between 0.0 and 2.0"));
                }
                self.llm.temperature = temp;
            }
            "llm.top_p" => {
                let top_p: f32 = value
                    .parse()
                    .with_context(|| format!("Invalid top_p value: {}", value))?;
                if !(0.0..=1.0).contains(&top_p) {
                    return Err(anyhow!("top_p must be between 0.0 and 1.0"));
                }
                self.llm.top_p = top_p;
            }
            "llm.top_k" => {
                let top_k: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid top_k value: {}", value))?;
                if top_k == 0 {
                    return Err(anyhow!("top_k must be at least 1"));
                }
                self.llm.top_k = top_k;
            }
            "llm.max_tokens" => {
                let max_tokens: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_tokens value: {}", value))?;
                if max_tokens == 0 {
                    return Err(anyhow!("max_tokens must be at least 1"));
                }
                self.llm.max_tokens = max_tokens;
            }
            "llm.timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid timeout_secs value: {}", value))?;
                if secs == 0 {
                    return Err(anyhow!("timeout_secs must be at least 1"));
                }
                self.llm.timeout_secs = secs;
            }

            // Cache settings
            "cache.backend" => {
                self.cache.backend = value.parse()?;
            }
            "cache.path" => {
                self.cache.path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "cache.root" => {
                if value.is_empty() || value.contains(':') {
                    return Err(anyhow!("Cache root must be non-empty and must not contain ':'"));
                }
                self.cache.root = value.to_string();
            }
            "cache.agent_ttl_secs" => {
                self.cache.agent_ttl_secs = parse_ttl("agent_ttl_secs", value)?;
            }
            "cache.aggregate_ttl_secs" => {
                self.cache.aggregate_ttl_secs = parse_ttl("aggregate_ttl_secs", value)?;
            }

            // API key cannot be set via config
            "llm.api_key" | "api_key" => {
                return Err(anyhow!(
                    "API keys cannot be stored in configuration for security. \
                     Set the HACKMATE_API_KEY or GEMINI_API_KEY environment variable instead."
                ));
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `hackmate config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "llm.model",
            "llm.base_url",
            "llm.temperature",
            "llm.top_p",
            "llm.top_k",
            "llm.max_tokens",
            "llm.timeout_secs",
            "llm.api_key",
            "cache.backend",
            "cache.path",
            "cache.root",
            "cache.agent_ttl_secs",
            "cache.aggregate_ttl_secs",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

/// Keep only the last four characters of a secret
fn redact_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "***".to_string();
    }
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("***{}", suffix)
}

fn parse_ttl(name: &str, value: &str) -> anyhow::Result<u64> {
    let secs: u64 = value
        .parse()
        .with_context(|| format!("Invalid {} value: {}", name, value))?;
    check_ttl(name, secs)?;
    Ok(secs)
}

fn check_ttl(name: &str, secs: u64) -> anyhow::Result<()> {
    if secs == 0 || secs > MAX_TTL_SECS {
        return Err(anyhow!("{} must be between 1 and {} seconds", name, MAX_TTL_SECS));
    }
    Ok(())
}
