use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::parse::options::MAX_TIMEOUT_SECONDS;
use crate::parse::{
    ChunkingStrategy, DocumentParserOptions, JobError, TableOutputMode, TableParsingFormat,
    TensorlakeClient, TensorlakeConfig,
};

pub const DOCUMENT_TOOL_NAME: &str = "DocumentToMarkdownConverter";

pub const DOCUMENT_TOOL_DESCRIPTION: &str = "Convert documents (PDF, DOCX, images, etc.) to markdown using Tensorlake AI. Supports tables, figures, signatures, and structured extraction.";

/// Fixed reply for agents that should not see raw error details.
pub const DOCUMENT_TOOL_ERROR_MESSAGE: &str =
    "Document parsing failed. Please verify the file path and your Tensorlake API key.";

/// Trait for tools callable by an agent: a name, a description, a JSON
/// Schema for the arguments, and an async `execute`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name of the tool.
    fn name(&self) -> &str;

    /// Description for the LLM prompt.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters.
    fn parameters(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: Value) -> anyhow::Result<String>;

    /// Function definition in the OpenAI `tools` format.
    fn definition(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameters(),
            }
        })
    }
}

/// What `execute` does with a failed conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ToolErrorPolicy {
    /// Return the error to the caller.
    Propagate,
    /// Return the error text as the tool output, so the agent can react to it.
    #[default]
    Report,
    /// Return a fixed message as the tool output.
    Message(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DocumentToolArgs {
    path: String,
    #[serde(default)]
    options: Option<DocumentParserOptions>,
}

pub struct DocumentMarkdownTool {
    client: TensorlakeClient,
    default_options: DocumentParserOptions,
    error_policy: ToolErrorPolicy,
}

impl DocumentMarkdownTool {
    /// Build from `TENSORLAKE_API_KEY` (and optional `TENSORLAKE_API_URL`).
    pub fn from_env() -> Result<Self, JobError> {
        Self::new(TensorlakeConfig::default())
    }

    /// Fails with `MissingApiKey` when the config carries no key.
    pub fn new(config: TensorlakeConfig) -> Result<Self, JobError> {
        let client = TensorlakeClient::new(&config)?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: TensorlakeClient) -> Self {
        let default_options = client.config().options.clone();
        Self {
            client,
            default_options,
            error_policy: ToolErrorPolicy::default(),
        }
    }

    pub fn with_error_policy(mut self, policy: ToolErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn default_options(&self) -> &DocumentParserOptions {
        &self.default_options
    }

    /// Parse `path` (local file, URL or file id) and return its markdown.
    pub async fn convert(
        &self,
        path: &str,
        options: &DocumentParserOptions,
    ) -> Result<String, JobError> {
        let result = self.client.parse_document(path, options).await?;
        Ok(result.to_markdown())
    }

    fn handle_error(&self, error: anyhow::Error) -> anyhow::Result<String> {
        warn!(tool = DOCUMENT_TOOL_NAME, error = %error, "Document tool failed");
        match &self.error_policy {
            ToolErrorPolicy::Propagate => Err(error),
            ToolErrorPolicy::Report => Ok(format!("Error processing document: {error}")),
            ToolErrorPolicy::Message(message) => Ok(message.clone()),
        }
    }
}

#[async_trait]
impl Tool for DocumentMarkdownTool {
    fn name(&self) -> &str {
        DOCUMENT_TOOL_NAME
    }

    fn description(&self) -> &str {
        DOCUMENT_TOOL_DESCRIPTION
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the document file to parse (PDF, DOCX, images, etc.) or an HTTP/HTTPS URL"
                },
                "options": options_schema()
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        debug!(tool = DOCUMENT_TOOL_NAME, args = %args, "Executing tool");

        let args: DocumentToolArgs = match serde_json::from_value(args) {
            Ok(args) => args,
            Err(e) => return self.handle_error(anyhow::anyhow!("Invalid arguments: {e}")),
        };
        let options = args.options.unwrap_or_else(|| self.default_options.clone());

        match self.convert(&args.path, &options).await {
            Ok(markdown) => Ok(markdown),
            Err(e) => self.handle_error(e.into()),
        }
    }
}

fn options_schema() -> Value {
    let defaults = DocumentParserOptions::default();
    // null turns chunking off
    let mut chunking: Vec<Value> = ChunkingStrategy::wire_values()
        .into_iter()
        .map(Value::from)
        .collect();
    chunking.push(Value::Null);

    json!({
        "type": "object",
        "description": "Parsing options. Omitted fields use their defaults.",
        "additionalProperties": false,
        "properties": {
            "chunking_strategy": {
                "type": ["string", "null"],
                "enum": chunking,
                "default": defaults.chunking_strategy,
                "description": "Strategy for chunking the document"
            },
            "table_parsing_format": {
                "type": "string",
                "enum": TableParsingFormat::wire_values(),
                "default": defaults.table_parsing_format,
                "description": "Algorithm for parsing tables (tsr for structured tables, vlm for complex or unstructured tables)"
            },
            "table_output_mode": {
                "type": "string",
                "enum": TableOutputMode::wire_values(),
                "default": defaults.table_output_mode,
                "description": "Format for table output"
            },
            "table_summarization": {
                "type": "boolean",
                "default": false,
                "description": "Whether to generate summaries of tables"
            },
            "table_summarization_prompt": {
                "type": "string",
                "description": "Custom prompt to guide table summarization"
            },
            "figure_summarization": {
                "type": "boolean",
                "default": false,
                "description": "Whether to generate summaries of figures and images"
            },
            "figure_summarization_prompt": {
                "type": "string",
                "description": "Custom prompt for figure summarization"
            },
            "page_range": {
                "type": "string",
                "description": "Specific page range to parse (e.g., '1-5' or '1,3,5')"
            },
            "skew_detection": {
                "type": "boolean",
                "default": false,
                "description": "Whether to apply skew correction to scanned documents"
            },
            "disable_layout_detection": {
                "type": "boolean",
                "default": false,
                "description": "Whether to disable automatic layout detection"
            },
            "signature_detection": {
                "type": "boolean",
                "default": false,
                "description": "Whether to detect the presence of signatures in the document"
            },
            "remove_strikethrough_lines": {
                "type": "boolean",
                "default": false,
                "description": "Whether to remove strikethrough text from the document"
            },
            "timeout_seconds": {
                "type": "integer",
                "minimum": 1,
                "maximum": MAX_TIMEOUT_SECONDS,
                "default": defaults.timeout_seconds,
                "description": "Maximum time to wait for processing completion (in seconds)"
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(policy: ToolErrorPolicy) -> DocumentMarkdownTool {
        let config = TensorlakeConfig {
            api_key: Some("tl_test".to_string()),
            base_url: "http://127.0.0.1:9/documents/v2".to_string(),
            ..Default::default()
        };
        DocumentMarkdownTool::new(config)
            .unwrap()
            .with_error_policy(policy)
    }

    #[test]
    fn construction_fails_without_api_key() {
        let config = TensorlakeConfig {
            api_key: None,
            ..Default::default()
        };
        assert!(matches!(
            DocumentMarkdownTool::new(config),
            Err(JobError::MissingApiKey)
        ));
    }

    #[test]
    fn definition_lists_enumerated_options() {
        let tool = tool(ToolErrorPolicy::Report);
        let definition = tool.definition();

        assert_eq!(definition["function"]["name"], DOCUMENT_TOOL_NAME);
        let options = &definition["function"]["parameters"]["properties"]["options"];
        assert_eq!(
            options["properties"]["chunking_strategy"]["enum"],
            json!(["none", "page", "section", "fragment", null])
        );
        assert_eq!(
            options["properties"]["chunking_strategy"]["type"],
            json!(["string", "null"])
        );
        assert_eq!(options["properties"]["chunking_strategy"]["default"], "page");
        assert_eq!(options["properties"]["timeout_seconds"]["default"], 300);
        assert_eq!(options["properties"]["timeout_seconds"]["maximum"], 86_400);
        assert_eq!(
            definition["function"]["parameters"]["required"],
            json!(["path"])
        );
    }

    #[tokio::test]
    async fn invalid_chunking_strategy_fails() {
        let tool = tool(ToolErrorPolicy::Propagate);
        let result = tool
            .execute(json!({ "path": "file_1", "options": { "chunking_strategy": "paragraph" } }))
            .await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("chunking_strategy"), "{err}");
    }

    #[tokio::test]
    async fn reported_errors_become_tool_output() {
        let tool = tool(ToolErrorPolicy::Report);
        let output = tool
            .execute(json!({ "path": "/definitely/missing.pdf" }))
            .await
            .unwrap();
        assert_eq!(
            output,
            "Error processing document: Document not found: /definitely/missing.pdf"
        );
    }

    #[tokio::test]
    async fn fixed_message_policy_hides_details() {
        let tool = tool(ToolErrorPolicy::Message(
            DOCUMENT_TOOL_ERROR_MESSAGE.to_string(),
        ));
        let output = tool.execute(json!({ "nope": true })).await.unwrap();
        assert_eq!(output, DOCUMENT_TOOL_ERROR_MESSAGE);
    }
}
