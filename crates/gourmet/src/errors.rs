use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Failures raised while resolving or executing a single tool call.
///
/// These never abort a conversation on their own: the agent turns them into
/// tool results so the model can see what went wrong and adapt.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Tool execution failed: {0}")]
    ExecutionError(String),

    #[error("Tool {name} may only be called {limit} time(s) per request; use the result you already have")]
    CallLimit { name: String, limit: usize },

    #[error("Tool {0} timed out")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AgentResult<T> = Result<T, AgentError>;

/// Failures of a whole chat turn, surfaced to the caller.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("The model kept requesting tools after {max_rounds} rounds")]
    ToolLoopExceeded { max_rounds: usize },

    #[error("The model did not answer within {0:?}")]
    ModelTimeout(Duration),

    #[error("Model provider error: {0}")]
    Provider(#[source] anyhow::Error),

    #[error("The request was cancelled")]
    Cancelled,

    #[error(transparent)]
    Agent(#[from] AgentError),
}

pub type ChatResult<T> = Result<T, ChatError>;
