use std::path::{Path, PathBuf};

use crate::parse::error::JobError;

/// Prefix of file ids handed out by the Tensorlake upload endpoint.
const FILE_ID_PREFIX: &str = "file_";

/// Broad document families accepted by DocumentAI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Word,
    Presentation,
    Spreadsheet,
    Image,
    Text,
}

impl DocumentKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        let kind = match extension.to_ascii_lowercase().as_str() {
            "pdf" => DocumentKind::Pdf,
            "doc" | "docx" => DocumentKind::Word,
            "ppt" | "pptx" | "key" => DocumentKind::Presentation,
            "xls" | "xlsx" | "csv" => DocumentKind::Spreadsheet,
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "gif" | "webp" => DocumentKind::Image,
            "txt" | "md" | "markdown" | "html" | "htm" => DocumentKind::Text,
            _ => return None,
        };
        Some(kind)
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Where the document to parse comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Remote document fetched by the service itself.
    Url(String),
    /// Local file, uploaded before parsing.
    File(PathBuf),
    /// A file already uploaded to Tensorlake.
    FileId(String),
    RawText(String),
}

impl DocumentSource {
    /// Classify a document reference given by a caller: an http(s) URL, an
    /// existing local file, or a previously uploaded file id.
    pub fn resolve(reference: &str) -> Result<Self, JobError> {
        let reference = reference.trim();

        if reference.starts_with("http://") || reference.starts_with("https://") {
            url::Url::parse(reference).map_err(|e| {
                JobError::DocumentNotFound(format!("{reference} is not a valid URL: {e}"))
            })?;
            return Ok(DocumentSource::Url(reference.to_string()));
        }

        let path = Path::new(reference);
        if path.is_file() {
            if DocumentKind::from_path(path).is_none() {
                return Err(JobError::UnsupportedDocument(reference.to_string()));
            }
            return Ok(DocumentSource::File(path.to_path_buf()));
        }

        if reference.starts_with(FILE_ID_PREFIX) && !reference.contains(['/', '\\']) {
            return Ok(DocumentSource::FileId(reference.to_string()));
        }

        Err(JobError::DocumentNotFound(reference.to_string()))
    }

    pub fn raw_text(text: impl Into<String>) -> Self {
        DocumentSource::RawText(text.into())
    }

    /// Short name used for log lines and output file names.
    pub fn display_name(&self) -> String {
        match self {
            DocumentSource::Url(url) => url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .unwrap_or("document")
                .to_string(),
            DocumentSource::File(path) => path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("document")
                .to_string(),
            DocumentSource::FileId(id) => id.clone(),
            DocumentSource::RawText(_) => "raw_text".to_string(),
        }
    }
}
