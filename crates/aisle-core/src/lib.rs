//! Aisle Core - Tool-using assistant for the wedding planner workspace
//!
//! This crate provides the core functionality behind the planner assistant:
//! - A two-phase agent loop (silent tool gathering, then one streamed answer)
//! - The planner tool set and its concurrent dispatcher
//! - UI actions (form prefill, allow-listed navigation)
//! - A genai-backed language model client
//! - Server-sent event framing

pub mod backend;
pub mod config;
pub mod encoder;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod tools;

pub use backend::{
    CoupleDraft, CoupleSummary, MemoryBackend, ModelCoupleParser, PlannerBackend, VendorStatus,
    VendorSummary,
};
pub use config::{AssistantConfig, Config, ConfigManager, ProviderConfig, ServerConfig};
pub use encoder::{encode_event, event_stream};
pub use error::{Error, Result, ToolError};
pub use prompt::SystemPrompt;
pub use provider::{Completion, GenAIClient, LlmClient, Message, ProviderType, Role, ToolCallRequest, ToolResult};
pub use session::{AgentLoop, AssistantRequest, EventSink, SessionState, StreamEvent};
pub use tools::{PendingAction, ToolDefinition, ToolDispatcher, ToolRegistry};
