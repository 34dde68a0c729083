//! Agent Loop - two-phase tool-use session
//!
//! The agent loop handles one assistant request:
//! - Gathering: blocking model calls, dispatching every requested tool
//!   concurrently, until the model stops asking or the iteration cap is hit.
//!   Nothing the model says during this phase reaches the caller.
//! - Streaming: once any tool has run, one streaming call narrates the final
//!   answer from the gathered data.
//! - Completion: the pending UI action (if any) and `done`, or a single
//!   `error` if the model connection failed at any point.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, Instrument};

use super::sink::EventSink;
use super::types::{Phase, SessionState, StreamEvent};
use crate::config::DEFAULT_MAX_ITERATIONS;
use crate::error::Result;
use crate::provider::{LlmClient, Message};
use crate::tools::{ToolDispatcher, ToolRegistry};

/// How the gathering phase ended
enum Gathered {
    /// No tool ever ran; this text is the whole answer
    Answer(String),
    /// Tools ran; the answer must be streamed
    NeedsNarration,
}

/// The assistant agent loop
///
/// Holds only read-only collaborators, so one instance is shared by every
/// request; each run owns its own history and [`SessionState`].
#[derive(Clone)]
pub struct AgentLoop {
    client: Arc<dyn LlmClient>,
    dispatcher: ToolDispatcher,
    registry: Arc<ToolRegistry>,
    max_iterations: usize,
}

impl AgentLoop {
    pub fn new(client: Arc<dyn LlmClient>, dispatcher: ToolDispatcher) -> Self {
        Self {
            client,
            dispatcher,
            registry: Arc::new(ToolRegistry::standard()),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Cap on tool rounds; at least one round always runs
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Run a session on a background task and return its event receiver
    pub fn start(&self, history: Vec<Message>, system: String, buffer: usize) -> mpsc::Receiver<StreamEvent> {
        let (sink, rx) = EventSink::channel(buffer);
        let agent = self.clone();
        let span = info_span!("assistant_session", request_id = %uuid::Uuid::new_v4());
        tokio::spawn(
            async move {
                agent.run(history, &system, &sink).await;
            }
            .instrument(span),
        );
        rx
    }

    /// Run a session to completion, emitting events into `sink`
    pub async fn run(&self, mut history: Vec<Message>, system: &str, sink: &EventSink) -> SessionState {
        let mut state = SessionState::new();
        info!(messages = history.len(), model = %self.client.model(), "Assistant session starting");

        match self.drive(&mut state, &mut history, system, sink).await {
            Ok(()) => {
                state.phase = Phase::Done;
                if let Some(action) = state.pending_action.clone() {
                    sink.emit(StreamEvent::action(action)).await;
                }
                sink.emit(StreamEvent::Done).await;
            }
            Err(e) => {
                state.phase = Phase::Error;
                error!(error = %e, iteration = state.iteration_count, "Assistant session failed");
                sink.emit(StreamEvent::error(e.to_string())).await;
            }
        }

        info!(
            iterations = state.iteration_count,
            tools_dispatched = state.tools_dispatched,
            action = state.pending_action.is_some(),
            phase = ?state.phase,
            "Assistant session ended"
        );
        state
    }

    async fn drive(
        &self,
        state: &mut SessionState,
        history: &mut Vec<Message>,
        system: &str,
        sink: &EventSink,
    ) -> Result<()> {
        match self.gather(state, history, system).await? {
            Gathered::Answer(text) => {
                sink.emit(StreamEvent::delta(text)).await;
            }
            Gathered::NeedsNarration => {
                state.phase = Phase::Streaming;
                self.narrate(history, system, sink).await?;
            }
        }
        Ok(())
    }

    /// Gathering phase: model turns and tool rounds, nothing emitted
    async fn gather(&self, state: &mut SessionState, history: &mut Vec<Message>, system: &str) -> Result<Gathered> {
        let tools = self.registry.list();
        let mut last_text = None;

        while state.iteration_count < self.max_iterations {
            let completion = self.client.complete(system, tools, history).await?;

            if completion.is_final() {
                last_text = completion.content;
                break;
            }

            debug!(
                iteration = state.iteration_count,
                tool_calls = completion.tool_calls.len(),
                "Dispatching tool calls"
            );

            let calls = completion.tool_calls;
            let outcomes = self.dispatcher.dispatch(&calls).await;
            history.push(Message::tool_calls(completion.content, calls));

            let mut results = Vec::with_capacity(outcomes.len());
            for outcome in outcomes {
                state.record_action(outcome.action);
                results.push(outcome.result);
            }
            history.push(Message::tool_results(results));

            state.tools_dispatched = true;
            state.iteration_count += 1;
        }

        if state.iteration_count >= self.max_iterations {
            info!(max_iterations = self.max_iterations, "Iteration cap reached; ending tool rounds");
        }

        if state.tools_dispatched {
            Ok(Gathered::NeedsNarration)
        } else {
            Ok(Gathered::Answer(last_text.unwrap_or_default()))
        }
    }

    /// Streaming phase: forward each fragment before pulling the next
    async fn narrate(&self, history: &[Message], system: &str, sink: &EventSink) -> Result<()> {
        let mut stream = self
            .client
            .stream_complete(system, self.registry.list(), history)
            .await?;

        let mut fragments = 0usize;
        while let Some(fragment) = stream.next().await {
            let text = fragment?;
            if text.is_empty() {
                continue;
            }
            fragments += 1;
            sink.emit(StreamEvent::delta(text)).await;
        }

        debug!(fragments, "Narration stream drained");
        Ok(())
    }
}
