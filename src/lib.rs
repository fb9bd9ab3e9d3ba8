// tensorlake-tools library - Tensorlake DocumentAI parsing exposed as an agent tool

pub mod config;
pub use config::AgentConfig;

#[cfg(feature = "parse")]
pub mod parse;

#[cfg(feature = "parse")]
pub use parse::{
    ChunkingStrategy, DocumentParserOptions, DocumentSource, JobError, OptionsError, ParseResult,
    TableOutputMode, TableParsingFormat, TensorlakeBackend, TensorlakeClient, TensorlakeConfig,
};

#[cfg(feature = "parse")]
pub mod tool;

#[cfg(feature = "parse")]
pub use tool::{DocumentMarkdownTool, Tool, ToolErrorPolicy};

#[cfg(feature = "agent")]
pub mod agent;

/// Environment variable holding the Tensorlake API key.
pub const TENSORLAKE_API_KEY_ENV: &str = "TENSORLAKE_API_KEY";

/// Environment variable overriding the Tensorlake API base URL.
pub const TENSORLAKE_API_URL_ENV: &str = "TENSORLAKE_API_URL";

/// Environment variable holding the OpenAI API key used by the example agent.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
