//! Assistant sessions
//!
//! One session serves one inbound request. The [`AgentLoop`] drives the
//! model and tools; events flow out through an [`EventSink`] to whatever
//! transport the caller uses.

mod agent_loop;
mod sink;
mod types;

pub use agent_loop::AgentLoop;
pub use sink::EventSink;
pub use types::{AssistantRequest, ChatTurn, Phase, SessionState, StreamEvent, ViewContext};
