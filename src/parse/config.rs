use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::parse::error::JobError;
use crate::parse::options::DocumentParserOptions;

pub const DEFAULT_BASE_URL: &str = "https://api.tensorlake.ai/documents/v2";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TensorlakeConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Seconds between job status checks.
    pub poll_interval: u64,
    /// Per-request HTTP timeout in seconds. The job wait is bounded
    /// separately by `options.timeout_seconds`.
    pub request_timeout: u64,
    pub max_concurrent: usize,
    pub use_cache: bool,
    pub output_dir: Option<String>,
    pub options: DocumentParserOptions,
}

impl Default for TensorlakeConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var(crate::TENSORLAKE_API_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_key: std::env::var(crate::TENSORLAKE_API_KEY_ENV).ok(),
            poll_interval: 5,
            request_timeout: 120,
            max_concurrent: 4,
            use_cache: true,
            output_dir: None, // Use default output directory (~/.tensorlake_parse)
            options: DocumentParserOptions::default(),
        }
    }
}

impl TensorlakeConfig {
    pub fn from_config_file(path: &str) -> anyhow::Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let mut config: TensorlakeConfig = serde_json::from_str(&contents)?;

        // A key in the environment fills in for one left out of the file
        if config.api_key.is_none() {
            config.api_key = std::env::var(crate::TENSORLAKE_API_KEY_ENV).ok();
        }

        Ok(config)
    }

    /// The configured API key, or `MissingApiKey` when unset or blank.
    pub fn require_api_key(&self) -> Result<&str, JobError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(JobError::MissingApiKey),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn output_dir(&self) -> anyhow::Result<PathBuf> {
        match self.output_dir {
            Some(ref dir) => Ok(PathBuf::from(dir)),
            None => Ok(dirs::home_dir()
                .ok_or_else(|| anyhow::Error::msg("Could not find home directory"))?
                .join(".tensorlake_parse")),
        }
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Get the file upload endpoint URL
    pub fn get_files_endpoint(&self) -> String {
        format!("{}/files", self.base())
    }

    /// Get the parse job creation endpoint URL
    pub fn get_parse_endpoint(&self) -> String {
        format!("{}/parse", self.base())
    }

    /// Get the parse job status/result endpoint URL
    pub fn get_parse_status_endpoint(&self, parse_id: &str) -> String {
        format!("{}/parse/{}", self.base(), parse_id)
    }
}
