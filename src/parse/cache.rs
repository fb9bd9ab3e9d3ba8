use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::parse::error::JobError;
use crate::parse::options::DocumentParserOptions;

/// Sidecar written next to every cached markdown file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub modified_time: u64,
    pub size: u64,
    pub cache_key: String,
    pub parsed_path: String,
    /// SHA-256 of the markdown at `parsed_path` when it was written.
    pub content_hash: String,
}

/// Stores converted markdown under `cache_dir`, keyed by file content and
/// the options used to parse it.
///
/// Output names are `<name>.<hash>.md`, where the hash covers the full
/// reference (canonical path or URL), so same-named documents from different
/// places never share an output file.
#[derive(Debug, Clone)]
pub struct CacheManager {
    pub cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Markdown is already readable, so there is nothing to convert.
    pub fn should_skip_file(&self, file_path: &str) -> bool {
        Path::new(file_path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "md" | "markdown"))
    }

    /// SHA-256 over the file bytes and the serialized options.
    pub async fn cache_key(
        &self,
        file_path: &str,
        options: &DocumentParserOptions,
    ) -> Result<String, JobError> {
        let contents = tokio::fs::read(file_path).await?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        hasher.update(serde_json::to_vec(options)?);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Path of the cached markdown for `reference`, if its metadata matches
    /// `cache_key` and the markdown on disk is the one that was recorded.
    pub async fn get_cached_result(&self, reference: &str, cache_key: &str) -> Result<String, JobError> {
        let metadata_path = self.metadata_path(reference);
        let contents = tokio::fs::read_to_string(&metadata_path).await?;
        let metadata: FileMetadata = serde_json::from_str(&contents)?;

        if metadata.cache_key != cache_key {
            return Err(JobError::InvalidResponse(format!(
                "Cached result for {reference} is stale"
            )));
        }

        let markdown = tokio::fs::read(&metadata.parsed_path).await.map_err(|e| {
            JobError::InvalidResponse(format!(
                "Cached output {} is unreadable: {e}",
                metadata.parsed_path
            ))
        })?;
        if sha256_hex(&markdown) != metadata.content_hash {
            return Err(JobError::InvalidResponse(format!(
                "Cached output {} was modified",
                metadata.parsed_path
            )));
        }

        Ok(metadata.parsed_path)
    }

    /// Write markdown for `reference`, plus its metadata when `cache_key` is
    /// given (`reference` must then be a local path). Returns the markdown path.
    pub async fn write_results_to_disk(
        &self,
        reference: &str,
        cache_key: Option<&str>,
        content: &str,
    ) -> Result<String, JobError> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let output_path = self.cache_dir.join(format!("{}.md", output_stem(reference)));
        tokio::fs::write(&output_path, content).await?;
        let output_path_str = output_path.to_string_lossy().to_string();

        if let Some(cache_key) = cache_key {
            let file_metadata = tokio::fs::metadata(reference).await?;
            let modified_time = file_metadata
                .modified()?
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();

            let metadata = FileMetadata {
                modified_time,
                size: file_metadata.len(),
                cache_key: cache_key.to_string(),
                parsed_path: output_path_str.clone(),
                content_hash: sha256_hex(content.as_bytes()),
            };

            tokio::fs::write(
                self.metadata_path(reference),
                serde_json::to_string_pretty(&metadata)?,
            )
            .await?;
        }

        Ok(output_path_str)
    }

    fn metadata_path(&self, reference: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.metadata.json", output_stem(reference)))
    }
}

/// Readable last segment of the reference plus 8 hex chars of its hash.
fn output_stem(reference: &str) -> String {
    let name: String = reference
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .and_then(|segment| segment.split(['?', '#']).next())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("document")
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("{name}.{}", &sha256_hex(reference.as_bytes())[..8])
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
