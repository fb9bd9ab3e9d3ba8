use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for the example document-analysis agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Upper bound on model round trips for a single question.
    pub max_iterations: usize,
    pub request_timeout: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var(crate::OPENAI_API_KEY_ENV).ok(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.1,
            max_iterations: 8,
            request_timeout: 120,
        }
    }
}

impl AgentConfig {
    pub fn from_config_file(path: &str) -> anyhow::Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let mut config: AgentConfig = serde_json::from_str(&contents)?;
        if config.api_key.is_none() {
            config.api_key = std::env::var(crate::OPENAI_API_KEY_ENV).ok();
        }
        Ok(config)
    }

    pub fn require_api_key(&self) -> anyhow::Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => anyhow::bail!("{} environment variable is not set", crate::OPENAI_API_KEY_ENV),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = AgentConfig::from_config_file("/nonexistent/agent.json").unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_iterations, 8);
        assert!((config.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn file_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agent.json");
        fs::write(&path, r#"{ "model": "gpt-4o-mini", "api_key": "sk-test" }"#).unwrap();

        let config = AgentConfig::from_config_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.require_api_key().unwrap(), "sk-test");
        assert_eq!(config.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn blank_key_is_missing() {
        let config = AgentConfig {
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(config.require_api_key().is_err());
    }
}
