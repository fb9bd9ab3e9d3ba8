use thiserror::Error;

/// Rejected parser options. Raised before anything is sent to the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("invalid {field} '{value}', expected one of: {expected}")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: String,
    },

    #[error("invalid page_range '{0}': expected pages like '1-5' or '1,3,5'")]
    InvalidPageRange(String),

    #[error("timeout_seconds must be greater than zero")]
    ZeroTimeout,

    #[error("timeout_seconds {seconds} exceeds the maximum of {max}")]
    TimeoutTooLarge { seconds: u64, max: u64 },

    #[error("{0} must not be blank when set")]
    BlankPrompt(&'static str),
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("{var} environment variable is not set", var = crate::TENSORLAKE_API_KEY_ENV)]
    MissingApiKey,

    #[error(transparent)]
    InvalidOptions(#[from] OptionsError),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("Tensorlake returned error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Document parsing failed with status: {status} (job {parse_id}){suffix}", suffix = message_suffix(.message))]
    JobFailed {
        parse_id: String,
        status: String,
        message: Option<String>,
    },

    #[error("Document processing timeout after {seconds} seconds. Job ID: {parse_id}")]
    TimeoutError { parse_id: String, seconds: u64 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Task failed to complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

fn message_suffix(message: &Option<String>) -> String {
    match message {
        Some(message) if !message.is_empty() => format!(": {message}"),
        _ => String::new(),
    }
}
