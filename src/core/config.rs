use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_addr: "127.0.0.1:3000".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RatesConfig {
    pub ttl_secs: u64,
    pub lookup_timeout_ms: u64,
}

impl Default for RatesConfig {
    fn default() -> Self {
        RatesConfig {
            ttl_secs: 300,
            lookup_timeout_ms: 5_000,
        }
    }
}

impl RatesConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    pub timeout_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig { timeout_ms: 20_000 }
    }
}

impl AnalysisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CompletionProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    pub search: Option<SearchProviderConfig>,
    pub completion: Option<CompletionProviderConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rates: RatesConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl AppConfig {
    /// Loads the config at the default location, or the built-in defaults
    /// when no file has been set up yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("ar", "pesofolio", "pesofolio")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
server:
  listen_addr: "0.0.0.0:8080"
rates:
  ttl_secs: 60
analysis:
  timeout_ms: 8000
providers:
  search:
    base_url: "http://example.com/search"
    api_key: "secret"
  completion:
    base_url: "http://example.com/v1"
    model: "llama-3"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.server.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.rates.ttl(), Duration::from_secs(60));
        assert_eq!(config.rates.lookup_timeout(), Duration::from_secs(5));
        assert_eq!(config.analysis.timeout(), Duration::from_secs(8));

        let search = config.providers.search.expect("search provider");
        assert_eq!(search.base_url, "http://example.com/search");
        assert_eq!(search.api_key.as_deref(), Some("secret"));

        let completion = config.providers.completion.expect("completion provider");
        assert_eq!(completion.model, "llama-3");
        assert!(completion.api_key.is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.rates.ttl_secs, 300);
        assert_eq!(config.analysis.timeout_ms, 20_000);
        assert!(config.providers.search.is_none());
        assert!(config.providers.completion.is_none());
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let result = AppConfig::load_from_path("/nonexistent/pesofolio/config.yaml");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
