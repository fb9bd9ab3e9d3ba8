pub mod chat;
pub mod error;
pub mod prompt;
pub mod runner;

pub use chat::{ChatClient, ChatMessage, FunctionCall, ToolCall};
pub use error::AgentError;
pub use prompt::{REACT_SYSTEM_PROMPT, build_document_analysis_prompt};
pub use runner::{Agent, DEFAULT_SIGNATURE_QUESTIONS, analyze_signatures};
