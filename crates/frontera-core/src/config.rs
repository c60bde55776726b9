//! Service configuration, loaded from a YAML file.
//!
//! Every field has a default, so a missing file or a partial file both work;
//! environment-specific overrides live in the file the operator points the
//! server at.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TCP port the HTTP server binds.
    pub port: u16,
    /// SQLite database location.
    pub database_path: PathBuf,
    pub coach: CoachConfig,
    pub analytics: AnalyticsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            database_path: PathBuf::from("frontera.db"),
            coach: CoachConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// Base URL of the OpenAI-compatible completion endpoint.
    pub base_url: String,
    /// Bearer token; empty means unauthenticated (local inference).
    pub api_key: String,
    pub model: String,
    /// Per-request timeout before the single retry kicks in.
    pub timeout_secs: u64,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Where usage events are POSTed. `None` disables emission entirely.
    pub endpoint: Option<String>,
}

impl Config {
    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.analytics.endpoint.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("frontera.yaml");
        std::fs::write(
            &path,
            "port: 9000\ncoach:\n  model: llama-3.1-70b\n  base_url: http://localhost:11434/v1\n",
        )
        .unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.coach.model, "llama-3.1-70b");
        assert_eq!(config.coach.timeout_secs, 30);
        assert_eq!(config.database_path, PathBuf::from("frontera.db"));
    }

    #[test]
    fn analytics_endpoint_parses() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("frontera.yaml");
        std::fs::write(&path, "analytics:\n  endpoint: http://events.internal/ingest\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.analytics.endpoint.as_deref(),
            Some("http://events.internal/ingest")
        );
    }
}
