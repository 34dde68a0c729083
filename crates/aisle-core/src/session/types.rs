//! Session types for the assistant agent loop
//!
//! These types define the request accepted from the caller and the events
//! streamed back while a session runs.

use serde::{Deserialize, Serialize};

use crate::provider::{Message, Role};
use crate::tools::PendingAction;

/// One chat turn as sent by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// Where the caller currently is in the app
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewContext {
    #[serde(default)]
    pub view: Option<String>,
}

/// Inbound assistant request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantRequest {
    #[serde(default)]
    pub messages: Vec<ChatTurn>,
    #[serde(default)]
    pub context: Option<ViewContext>,
}

impl AssistantRequest {
    /// Check the request is usable before any session starts
    pub fn validate(&self) -> Result<(), String> {
        if self.messages.is_empty() {
            return Err("messages must be a non-empty array".to_string());
        }
        Ok(())
    }

    /// Initial history for the agent loop
    pub fn history(&self) -> Vec<Message> {
        self.messages
            .iter()
            .map(|turn| Message::Text {
                role: turn.role,
                content: turn.content.clone(),
            })
            .collect()
    }

    pub fn view(&self) -> Option<&str> {
        self.context.as_ref().and_then(|c| c.view.as_deref())
    }
}

/// Events sent FROM a session to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental answer text
    Delta { text: String },
    /// The single pending UI action, after all deltas
    Action { action: PendingAction },
    /// Successful end of the stream
    Done,
    /// Fatal failure; no `Done` follows
    Error { message: String },
}

impl StreamEvent {
    pub fn delta(text: impl Into<String>) -> Self {
        Self::Delta { text: text.into() }
    }

    pub fn action(action: PendingAction) -> Self {
        Self::Action { action }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Whether this event ends the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}

/// Macro-state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Silent tool-gathering rounds
    Gathering,
    /// Final answer streaming
    Streaming,
    Done,
    Error,
}

/// Per-request state, discarded when the request ends
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub iteration_count: usize,
    pub phase: Phase,
    /// Whether any tool has run in this session
    pub tools_dispatched: bool,
    /// Latest successfully produced action
    pub pending_action: Option<PendingAction>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            iteration_count: 0,
            phase: Phase::Gathering,
            tools_dispatched: false,
            pending_action: None,
        }
    }

    /// Apply the overwrite rule: only a produced action replaces the held one
    pub fn record_action(&mut self, action: Option<PendingAction>) {
        if let Some(action) = action {
            self.pending_action = Some(action);
        }
    }
}
