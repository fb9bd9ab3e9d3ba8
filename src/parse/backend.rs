use std::fs;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::{debug, warn};

use crate::parse::cache::CacheManager;
use crate::parse::client::TensorlakeClient;
use crate::parse::config::TensorlakeConfig;
use crate::parse::error::JobError;
use crate::parse::options::DocumentParserOptions;
use crate::parse::source::DocumentSource;

/// Converts batches of documents to markdown files on disk.
pub struct TensorlakeBackend {
    client: TensorlakeClient,
    cache_manager: CacheManager,
    options: DocumentParserOptions,
    max_concurrent: usize,
    use_cache: bool,
}

impl TensorlakeBackend {
    pub fn new(config: TensorlakeConfig) -> anyhow::Result<Self> {
        let client = TensorlakeClient::new(&config)?;
        Self::with_client(client)
    }

    pub fn with_client(client: TensorlakeClient) -> anyhow::Result<Self> {
        let config = client.config().clone();
        config.options.validate()?;

        let cache_dir = config.output_dir()?;
        fs::create_dir_all(&cache_dir)?;

        Ok(Self {
            client,
            cache_manager: CacheManager::new(cache_dir),
            options: config.options,
            max_concurrent: config.max_concurrent.max(1),
            use_cache: config.use_cache,
        })
    }

    /// Convert each reference and return the markdown path for each success.
    /// Markdown inputs are returned as-is; failures are logged and skipped.
    pub async fn parse(&self, files: Vec<String>) -> Result<Vec<String>, JobError> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::new();
        let mut results = Vec::new();

        for file_path in files {
            // Skip if file doesn't need parsing (already markdown)
            if self.cache_manager.should_skip_file(&file_path) {
                debug!(file = %file_path, "Skipping readable file");
                results.push(file_path);
                continue;
            }

            let semaphore = Arc::clone(&semaphore);
            let client = self.client.clone();
            let cache_manager = self.cache_manager.clone();
            let options = self.options.clone();
            let use_cache = self.use_cache;

            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| JobError::InvalidResponse(format!("Semaphore closed: {e}")))?;

                Self::process_single_document(client, file_path, options, cache_manager, use_cache)
                    .await
            });

            handles.push(handle);
        }

        // Wait for all tasks to complete
        results.extend(collect_outputs(futures::future::join_all(handles).await));

        Ok(results)
    }

    async fn process_single_document(
        client: TensorlakeClient,
        file_path: String,
        options: DocumentParserOptions,
        cache_manager: CacheManager,
        use_cache: bool,
    ) -> Result<String, JobError> {
        let source = DocumentSource::resolve(&file_path)?;

        // Local files are named by canonical path so that different spellings
        // of one file share a cache entry.
        let reference = match source {
            DocumentSource::File(ref path) => tokio::fs::canonicalize(path)
                .await?
                .to_string_lossy()
                .to_string(),
            _ => file_path.clone(),
        };

        let cache_key = match source {
            DocumentSource::File(_) if use_cache => {
                Some(cache_manager.cache_key(&reference, &options).await?)
            }
            _ => None,
        };

        if let Some(ref key) = cache_key {
            if let Ok(cached_path) = cache_manager.get_cached_result(&reference, key).await {
                debug!(file = %file_path, "Using cached result");
                return Ok(cached_path);
            }
        }

        debug!(file = %file_path, "Processing file with Tensorlake");
        let result = client.parse_source(&source, &options).await?;

        cache_manager
            .write_results_to_disk(&reference, cache_key.as_deref(), &result.to_markdown())
            .await
    }
}

/// Keep the paths of finished documents. Failed and panicked tasks are
/// logged and dropped without affecting the rest of the batch.
fn collect_outputs(
    outcomes: Vec<Result<Result<String, JobError>, JoinError>>,
) -> Vec<String> {
    let mut paths = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(Ok(path)) => paths.push(path),
            Ok(Err(e)) => warn!(error = %e, "Error processing file"),
            Err(e) => warn!(error = %e, "Document task did not complete"),
        }
    }
    paths
}
