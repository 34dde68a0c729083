//! Language model client abstraction
//!
//! The agent loop talks to the model through [`LlmClient`], which offers a
//! blocking call that may request tools and a streaming call that yields
//! text fragments. [`GenAIClient`] implements it on top of the genai
//! framework, so any provider genai supports can back the assistant.

mod genai_provider;
mod logging;

pub use genai_provider::{GenAIClient, ProviderType};

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::tools::ToolDefinition;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Correlation id assigned by the model
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// Result of one tool invocation, correlated by `id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub id: String,
    /// Tool output, or `{"error": "..."}`
    pub payload: Value,
}

impl ToolResult {
    pub fn ok(id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }

    pub fn error(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: serde_json::json!({ "error": message.into() }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.payload.get("error").is_some()
    }
}

/// Message in a conversation history
///
/// Plain chat turns and the two tool-protocol turns live in one history:
/// the assistant turn that requested tools, and the synthetic user turn
/// carrying every result for that step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    /// Regular text turn
    Text { role: Role, content: String },
    /// Assistant turn with tool invocation requests
    ToolCalls {
        /// Optional text produced alongside the requests
        content: Option<String>,
        calls: Vec<ToolCallRequest>,
    },
    /// Results for every request of the preceding tool-call turn
    ToolResults { results: Vec<ToolResult> },
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::Text {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Text {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn tool_calls(content: Option<String>, calls: Vec<ToolCallRequest>) -> Self {
        Self::ToolCalls { content, calls }
    }

    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self::ToolResults { results }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::Text { role, .. } => *role,
            Self::ToolCalls { .. } => Role::Assistant,
            Self::ToolResults { .. } => Role::User,
        }
    }
}

/// Why the model stopped producing output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of turn
    EndTurn,
    /// Model is waiting on tool results
    ToolUse,
}

/// Response from a blocking completion
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Text content from the assistant (may be present even with tool calls)
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
    pub stop_reason: StopReason,
}

impl Completion {
    /// Plain text response with a natural stop
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            stop_reason: StopReason::EndTurn,
        }
    }

    /// Response requesting tools
    pub fn with_tool_calls(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            content,
            tool_calls,
            stop_reason: StopReason::ToolUse,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// True when the agent loop should stop gathering
    pub fn is_final(&self) -> bool {
        !self.has_tool_calls() || self.stop_reason == StopReason::EndTurn
    }
}

/// Finite stream of answer text fragments
pub type TextStream = BoxStream<'static, Result<String>>;

/// Remote conversational model
///
/// Both calls fail atomically: an `Err` means no usable output.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Model identifier (for logging)
    fn model(&self) -> &str;

    /// Run one full turn and return text and/or tool requests
    async fn complete(
        &self,
        system: &str,
        tools: &[ToolDefinition],
        messages: &[Message],
    ) -> Result<Completion>;

    /// Run one turn, yielding text fragments as they are produced
    async fn stream_complete(
        &self,
        system: &str,
        tools: &[ToolDefinition],
        messages: &[Message],
    ) -> Result<TextStream>;
}
