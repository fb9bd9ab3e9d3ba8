use std::sync::Arc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::agent::chat::{ChatClient, ChatMessage, ToolCall};
use crate::agent::error::AgentError;
use crate::agent::prompt::build_document_analysis_prompt;
use crate::parse::DocumentParserOptions;
use crate::tool::{DocumentMarkdownTool, Tool};

pub const DEFAULT_SIGNATURE_QUESTIONS: &[&str] = &[
    "How many signatures were detected in this document and who are the parties involved?",
    "What contextual information can you extract about any signatures?",
    "Are there any missing signatures on any pages?",
];

/// Calls an OpenAI chat-completions model in a loop, running requested tools,
/// until it answers without asking for another tool.
pub struct Agent {
    chat: ChatClient,
    system_prompt: Option<String>,
    tools: Vec<Arc<dyn Tool>>,
    max_iterations: usize,
}

impl Agent {
    pub fn new(chat: ChatClient) -> Self {
        Self {
            chat,
            system_prompt: None,
            tools: Vec::new(),
            max_iterations: 8,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Answer a single user message; returns the final assistant text.
    pub async fn run(&self, user_message: &str) -> Result<String, AgentError> {
        let transcript = self.run_messages(vec![ChatMessage::user(user_message)]).await?;
        Ok(transcript
            .last()
            .and_then(|m| m.content.clone())
            .unwrap_or_default())
    }

    /// Continue a conversation. Returns the whole transcript, ending with
    /// the assistant's final message.
    pub async fn run_messages(
        &self,
        mut messages: Vec<ChatMessage>,
    ) -> Result<Vec<ChatMessage>, AgentError> {
        if let Some(ref prompt) = self.system_prompt {
            if messages.first().is_none_or(|m| m.role != "system") {
                messages.insert(0, ChatMessage::system(prompt.clone()));
            }
        }

        let definitions: Vec<Value> = self.tools.iter().map(|t| t.definition()).collect();

        for iteration in 1..=self.max_iterations {
            let reply = self.chat.complete(&messages, &definitions).await?;
            let calls = reply.requested_tool_calls().to_vec();
            messages.push(reply);

            if calls.is_empty() {
                debug!(iteration, "Agent produced final answer");
                return Ok(messages);
            }

            for call in &calls {
                let output = self.call_tool(call).await;
                messages.push(ChatMessage::tool_result(call.id.clone(), output));
            }
        }

        Err(AgentError::TooManyIterations(self.max_iterations))
    }

    async fn call_tool(&self, call: &ToolCall) -> String {
        let name = call.function.name.as_str();
        info!(tool = name, call_id = %call.id, "Agent tool call");

        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            warn!(tool = name, "Model requested unknown tool");
            return format!("Error: unknown tool '{name}'");
        };

        let args: Value = match serde_json::from_str(&call.function.arguments) {
            Ok(args) => args,
            Err(e) => return format!("Error: invalid arguments for {name}: {e}"),
        };

        match tool.execute(args).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                format!("Error: {e}")
            }
        }
    }
}

/// Parse `path` with signature detection, then ask `agent` the questions
/// about the parsed output.
pub async fn analyze_signatures<S: AsRef<str>>(
    tool: &DocumentMarkdownTool,
    agent: &Agent,
    path: &str,
    questions: &[S],
) -> Result<String, AgentError> {
    let options = DocumentParserOptions {
        signature_detection: true,
        ..tool.default_options().clone()
    };

    info!(path, "Processing document with signature detection");
    let parsed = tool.convert(path, &options).await?;

    let prompt = build_document_analysis_prompt(&parsed, questions);
    agent.run(&prompt).await
}
