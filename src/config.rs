//! Service configuration: defaults, an optional TOML file, and environment
//! overrides, applied in that order.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Completion provider: "anthropic", "openai" or "openrouter".
    pub provider: String,
    pub model: String,
    /// Read from the environment when absent from the file.
    pub api_key: Option<String>,
    pub bind: String,
    pub db_path: PathBuf,
    pub cache_capacity: usize,
    /// None disables the TTL; the "optimized" deployment sets 30.
    pub cache_ttl_minutes: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key: None,
            bind: "127.0.0.1:8087".to_string(),
            db_path: default_db_path(),
            cache_capacity: 1000,
            cache_ttl_minutes: None,
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("readmate")
        .join("sessions.db")
}

impl AppConfig {
    /// Load configuration: defaults, then the TOML file (if given), then
    /// environment variables.
    pub fn load(config_path: Option<&Path>) -> Result<Self, String> {
        let mut config = match config_path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file {:?}: {}", path, e))?;
                toml::from_str(&text)
                    .map_err(|e| format!("Failed to parse config file {:?}: {}", path, e))?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Overlay environment variables. The lookup is injected so tests don't
    /// have to mutate the process environment.
    pub fn apply_env_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = get("READMATE_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = get("READMATE_MODEL") {
            self.model = model;
        }
        if let Some(key) = get("READMATE_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(bind) = get("READMATE_BIND") {
            self.bind = bind;
        }
        if let Some(db_path) = get("READMATE_DB_PATH") {
            self.db_path = PathBuf::from(db_path);
        }
        if let Some(minutes) = get("READMATE_CACHE_TTL_MINUTES") {
            self.cache_ttl_minutes = minutes.parse().ok();
        }

        // Provider-native key variables as a fallback.
        if self.api_key.is_none() {
            let native = match self.provider.as_str() {
                "anthropic" | "claude" => "ANTHROPIC_API_KEY",
                "openai" => "OPENAI_API_KEY",
                "openrouter" => "OPENROUTER_API_KEY",
                _ => return,
            };
            self.api_key = get(native);
        }
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_minutes.map(|m| Duration::from_secs(m * 60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "anthropic");
        assert_eq!(config.cache_capacity, 1000);
        assert!(config.cache_ttl_minutes.is_none());
        assert!(config.cache_ttl().is_none());
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            provider = "openai"
            model = "gpt-4o-mini"
            bind = "0.0.0.0:9000"
            cache_ttl_minutes = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(1800)));
        // Unset fields keep their defaults.
        assert_eq!(config.cache_capacity, 1000);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| match name {
            "READMATE_PROVIDER" => Some("openrouter".to_string()),
            "READMATE_API_KEY" => Some("sk-or-test".to_string()),
            "READMATE_CACHE_TTL_MINUTES" => Some("30".to_string()),
            _ => None,
        });
        assert_eq!(config.provider, "openrouter");
        assert_eq!(config.api_key.as_deref(), Some("sk-or-test"));
        assert_eq!(config.cache_ttl_minutes, Some(30));
    }

    #[test]
    fn test_provider_native_key_is_a_fallback() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| match name {
            "ANTHROPIC_API_KEY" => Some("sk-ant-test".to_string()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-ant-test"));

        // An explicit key wins over the native variable.
        let mut config = AppConfig::default();
        config.api_key = Some("explicit".to_string());
        config.apply_env_overrides(|name| match name {
            "ANTHROPIC_API_KEY" => Some("sk-ant-test".to_string()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("explicit"));
    }
}
