use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::parse::config::TensorlakeConfig;
use crate::parse::error::{JobError, OptionsError};
use crate::parse::options::{
    DocumentParserOptions, EnrichmentOptions, MAX_TIMEOUT_SECONDS, ParsingOptions,
};
use crate::parse::source::DocumentSource;

/// Lifecycle of a parse job as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    Pending,
    #[serde(alias = "detecting_layout", alias = "detected_layout")]
    #[serde(alias = "extracting_data", alias = "extracted_data")]
    #[serde(alias = "formatting_output", alias = "formatted_output")]
    Processing,
    Successful,
    Failure,
    #[serde(other)]
    Unknown,
}

impl ParseStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, ParseStatus::Pending | ParseStatus::Processing)
    }
}

impl fmt::Display for ParseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParseStatus::Pending => "pending",
            ParseStatus::Processing => "processing",
            ParseStatus::Successful => "successful",
            ParseStatus::Failure => "failure",
            ParseStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    pub content: String,
}

/// A parse job as returned by `GET /parse/{parse_id}`. Fields this crate
/// does not interpret are kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    #[serde(default)]
    pub parse_id: String,
    pub status: ParseStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chunks: Vec<Chunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ParseResult {
    /// Markdown of all chunks separated by blank lines. Without chunks the
    /// whole result is returned as pretty JSON so nothing is lost.
    pub fn to_markdown(&self) -> String {
        let chunks: Vec<&str> = self
            .chunks
            .iter()
            .map(|c| c.content.trim())
            .filter(|c| !c.is_empty())
            .collect();

        if !chunks.is_empty() {
            return chunks.join("\n\n");
        }

        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateParseResponse {
    parse_id: String,
}

#[derive(Debug, Serialize)]
struct ParseRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    file_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_range: Option<&'a str>,
    parsing_options: ParsingOptions,
    enrichment_options: EnrichmentOptions,
}

#[derive(Debug, Clone)]
pub struct TensorlakeClient {
    client: reqwest::Client,
    config: TensorlakeConfig,
    api_key: String,
    poll_interval: Duration,
}

impl TensorlakeClient {
    /// Fails fast with `MissingApiKey` before any network traffic.
    pub fn new(config: &TensorlakeConfig) -> Result<Self, JobError> {
        let api_key = config.require_api_key()?.to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
            poll_interval: config.poll_interval(),
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn config(&self) -> &TensorlakeConfig {
        &self.config
    }

    /// Upload a local file and return its Tensorlake file id.
    pub async fn upload_file(&self, path: &Path) -> Result<String, JobError> {
        let file_content = tokio::fs::read(path).await?;

        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        debug!(
            file = %path.display(),
            mime = %mime,
            endpoint = %self.config.get_files_endpoint(),
            "Uploading file to Tensorlake"
        );

        let file_part = reqwest::multipart::Part::bytes(file_content)
            .file_name(filename)
            .mime_str(mime.as_ref())?;
        let form = reqwest::multipart::Form::new().part("file", file_part);

        let response = self
            .client
            .put(self.config.get_files_endpoint())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let upload: UploadResponse = Self::read_json(response).await?;
        debug!(file_id = %upload.file_id, "Upload complete");
        Ok(upload.file_id)
    }

    /// Submit a parse job and return its id. Local files are uploaded first.
    pub async fn start_parse(
        &self,
        source: &DocumentSource,
        options: &DocumentParserOptions,
    ) -> Result<String, JobError> {
        let uploaded_id;
        let (file_id, file_url, raw_text) = match source {
            DocumentSource::File(path) => {
                uploaded_id = self.upload_file(path).await?;
                (Some(uploaded_id.as_str()), None, None)
            }
            DocumentSource::FileId(id) => (Some(id.as_str()), None, None),
            DocumentSource::Url(url) => (None, Some(url.as_str()), None),
            DocumentSource::RawText(text) => (None, None, Some(text.as_str())),
        };

        let request = ParseRequest {
            file_id,
            file_url,
            raw_text,
            page_range: options.page_range.as_deref(),
            parsing_options: options.parsing_options(),
            enrichment_options: options.enrichment_options(),
        };

        debug!(request = ?request, "Submitting parse job");

        let response = self
            .client
            .post(self.config.get_parse_endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let created: CreateParseResponse = Self::read_json(response).await?;
        info!(parse_id = %created.parse_id, document = %source.display_name(), "Started parse job");
        Ok(created.parse_id)
    }

    pub async fn get_parse(&self, parse_id: &str) -> Result<ParseResult, JobError> {
        let response = self
            .client
            .get(self.config.get_parse_status_endpoint(parse_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        Self::read_json(response).await
    }

    /// Poll a job until it succeeds, fails, or `timeout` elapses. A poll still
    /// in flight at the deadline is abandoned.
    pub async fn wait_for_completion(
        &self,
        parse_id: &str,
        timeout: Duration,
    ) -> Result<ParseResult, JobError> {
        let timed_out = || JobError::TimeoutError {
            parse_id: parse_id.to_string(),
            seconds: timeout.as_secs(),
        };
        let deadline = Instant::now().checked_add(timeout).ok_or_else(|| {
            OptionsError::TimeoutTooLarge {
                seconds: timeout.as_secs(),
                max: MAX_TIMEOUT_SECONDS,
            }
        })?;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let result = tokio::time::timeout_at(deadline, self.get_parse(parse_id))
                .await
                .map_err(|_| timed_out())??;
            debug!(parse_id, attempt = attempts, status = %result.status, "Polled parse job");

            match result.status {
                ParseStatus::Successful => {
                    info!(parse_id, chunks = result.chunks.len(), "Parse job finished");
                    return Ok(result);
                }
                status if status.is_in_progress() => {}
                status => {
                    return Err(JobError::JobFailed {
                        parse_id: parse_id.to_string(),
                        status: status.to_string(),
                        message: result.error,
                    });
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(timed_out());
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// Full flow for one document reference: validate, classify, submit, wait.
    pub async fn parse_document(
        &self,
        reference: &str,
        options: &DocumentParserOptions,
    ) -> Result<ParseResult, JobError> {
        options.validate()?;
        let source = DocumentSource::resolve(reference)?;
        self.parse_source(&source, options).await
    }

    pub async fn parse_source(
        &self,
        source: &DocumentSource,
        options: &DocumentParserOptions,
    ) -> Result<ParseResult, JobError> {
        options.validate()?;
        let parse_id = self.start_parse(source, options).await?;
        self.wait_for_completion(&parse_id, options.timeout()).await
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, JobError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JobError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            JobError::InvalidResponse(format!("Failed to parse Tensorlake response: {e}"))
        })
    }
}
