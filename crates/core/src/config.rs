//! Engine configuration.
//!
//! Layered in order: built-in defaults, then `<workspace>/.rescope.json`, then
//! `RESCOPE_*` environment variables.

use crate::error::{RescopeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE: &str = ".rescope.json";

pub const ENV_CACHE_TTL_SECS: &str = "RESCOPE_CACHE_TTL_SECS";
pub const ENV_CACHE_CAPACITY: &str = "RESCOPE_CACHE_CAPACITY";
pub const ENV_DEBOUNCE_MS: &str = "RESCOPE_DEBOUNCE_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds a cache entry stays valid after insertion.
    pub cache_ttl_secs: u64,
    /// Maximum number of cached projects.
    pub cache_capacity: usize,
    /// Quiet period before a pending rescan fires.
    pub debounce_ms: u64,
    /// Descend into hidden directories while scanning.
    pub follow_hidden: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 300,
            cache_capacity: 100,
            debounce_ms: 500,
            follow_hidden: false,
        }
    }
}

impl EngineConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Load the full layered configuration for a workspace.
    pub fn load(workspace_root: &Path) -> Result<Self> {
        let mut config = Self::from_workspace_file(workspace_root)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `.rescope.json`, when present.
    pub fn from_workspace_file(workspace_root: &Path) -> Result<Self> {
        let path = workspace_root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map_err(|e| RescopeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Overlay variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_CACHE_TTL_SECS) {
            self.cache_ttl_secs = parse_var(ENV_CACHE_TTL_SECS, &v)?;
        }
        if let Some(v) = lookup(ENV_CACHE_CAPACITY) {
            self.cache_capacity = parse_var(ENV_CACHE_CAPACITY, &v)?;
        }
        if let Some(v) = lookup(ENV_DEBOUNCE_MS) {
            self.debounce_ms = parse_var(ENV_DEBOUNCE_MS, &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(RescopeError::Config(
                "cache_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| RescopeError::Config(format!("{}={:?}: {}", key, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.cache_capacity, 100);
        assert_eq!(config.debounce(), Duration::from_millis(500));
    }

    #[test]
    fn test_layers_file_then_env() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "cache_capacity": 10, "debounce_ms": 50 }"#,
        )
        .unwrap();

        let mut config = EngineConfig::from_workspace_file(dir.path()).unwrap();
        assert_eq!(config.cache_capacity, 10);
        assert_eq!(config.cache_ttl_secs, 300);

        let env: HashMap<&str, &str> = [(ENV_DEBOUNCE_MS, "20")].into_iter().collect();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.debounce_ms, 20);
        assert_eq!(config.cache_capacity, 10);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_env(|k| (k == ENV_CACHE_CAPACITY).then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, RescopeError::Config(_)));

        config.cache_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{ nope").unwrap();
        assert!(matches!(
            EngineConfig::from_workspace_file(dir.path()),
            Err(RescopeError::Config(_))
        ));
    }
}
