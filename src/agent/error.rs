use thiserror::Error;

use crate::parse::JobError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{0}")]
    Config(String),

    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("LLM returned no choices")]
    EmptyResponse,

    #[error("agent stopped after {0} iterations without a final answer")]
    TooManyIterations(usize),

    #[error(transparent)]
    Document(#[from] JobError),
}
