//! Shared test doubles for the agent loop and dispatcher tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Value, json};

use aisle_core::backend::{CoupleDraft, CoupleSummary, PlannerBackend, VendorStatus, VendorSummary};
use aisle_core::error::{Error, Result};
use aisle_core::provider::{Completion, LlmClient, Message, TextStream, ToolCallRequest};
use aisle_core::session::{EventSink, StreamEvent};
use aisle_core::tools::ToolDefinition;

pub fn call(id: &str, name: &str, input: Value) -> ToolCallRequest {
    ToolCallRequest {
        id: id.to_string(),
        name: name.to_string(),
        input,
    }
}

/// How the streaming call should behave
pub enum StreamScript {
    Fragments(Vec<&'static str>),
    FailAfter(Vec<&'static str>),
    FailToStart,
}

/// Language model double that replays scripted responses
pub struct ScriptedClient {
    completions: Mutex<VecDeque<Result<Completion>>>,
    /// Returned once the script runs out, when set
    repeat_tools: Option<Vec<ToolCallRequest>>,
    stream: Mutex<Option<StreamScript>>,
    pub complete_calls: AtomicUsize,
    pub stream_calls: AtomicUsize,
    histories: Mutex<Vec<Vec<Message>>>,
    tool_counts: Mutex<Vec<usize>>,
}

impl ScriptedClient {
    pub fn new(completions: Vec<Result<Completion>>) -> Self {
        Self {
            completions: Mutex::new(completions.into()),
            repeat_tools: None,
            stream: Mutex::new(None),
            complete_calls: AtomicUsize::new(0),
            stream_calls: AtomicUsize::new(0),
            histories: Mutex::new(Vec::new()),
            tool_counts: Mutex::new(Vec::new()),
        }
    }

    pub fn always_calling(calls: Vec<ToolCallRequest>) -> Self {
        let mut client = Self::new(Vec::new());
        client.repeat_tools = Some(calls);
        client
    }

    pub fn with_stream(self, script: StreamScript) -> Self {
        *self.stream.lock().unwrap() = Some(script);
        self
    }

    pub fn complete_count(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }

    pub fn stream_count(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    /// History passed to every call, in call order
    pub fn histories(&self) -> Vec<Vec<Message>> {
        self.histories.lock().unwrap().clone()
    }

    /// Number of tool definitions passed to every call
    pub fn tool_counts(&self) -> Vec<usize> {
        self.tool_counts.lock().unwrap().clone()
    }

    fn record(&self, tools: &[ToolDefinition], messages: &[Message]) {
        self.histories.lock().unwrap().push(messages.to_vec());
        self.tool_counts.lock().unwrap().push(tools.len());
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _system: &str, tools: &[ToolDefinition], messages: &[Message]) -> Result<Completion> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        self.record(tools, messages);
        if let Some(next) = self.completions.lock().unwrap().pop_front() {
            return next;
        }
        match &self.repeat_tools {
            Some(calls) => Ok(Completion::with_tool_calls(Some("still looking".to_string()), calls.clone())),
            None => Ok(Completion::text("")),
        }
    }

    async fn stream_complete(
        &self,
        _system: &str,
        tools: &[ToolDefinition],
        messages: &[Message],
    ) -> Result<TextStream> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.record(tools, messages);
        let script = self
            .stream
            .lock()
            .unwrap()
            .take()
            .unwrap_or(StreamScript::Fragments(vec!["Here is ", "what I found."]));

        let items: Vec<Result<String>> = match script {
            StreamScript::Fragments(parts) => parts.into_iter().map(|p| Ok(p.to_string())).collect(),
            StreamScript::FailAfter(parts) => parts
                .into_iter()
                .map(|p| Ok(p.to_string()))
                .chain(std::iter::once(Err(Error::Provider("connection reset".to_string()))))
                .collect(),
            StreamScript::FailToStart => return Err(Error::Provider("stream refused".to_string())),
        };
        Ok(futures::stream::iter(items).boxed())
    }
}

/// Planner backend double
///
/// `couple_vendors` treats the id as a script: `slow-*`, `medium-*` and
/// `fast-*` sleep 30/20/10ms, `panic` panics, `missing` fails. The vendor
/// name echoes the id so results can be matched to requests.
pub struct TestBackend;

#[async_trait]
impl PlannerBackend for TestBackend {
    async fn list_couples(&self) -> Result<Vec<CoupleSummary>> {
        Ok(vec![CoupleSummary {
            id: "c1".to_string(),
            share_token: "ana-ben".to_string(),
            names: "Ana & Ben".to_string(),
            date: None,
            location: Some("Lisbon".to_string()),
            venue_name: None,
            notes: None,
        }])
    }

    async fn couple_vendors(&self, couple_id: &str) -> Result<Vec<VendorSummary>> {
        let delay = if couple_id.starts_with("slow") {
            30
        } else if couple_id.starts_with("medium") {
            20
        } else if couple_id.starts_with("fast") {
            10
        } else {
            0
        };
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        match couple_id {
            "panic" => panic!("vendor lookup exploded"),
            "missing" => Err(Error::Backend(format!("couple not found: {}", couple_id))),
            id => Ok(vec![VendorSummary {
                name: id.to_string(),
                category: "Florist".to_string(),
                normalized_status: VendorStatus::Booked,
                planner_note: None,
                couple_note: None,
            }]),
        }
    }

    async fn parse_couple(&self, description: &str) -> Result<CoupleDraft> {
        Ok(CoupleDraft {
            names: description.to_string(),
            date: None,
            location: None,
            venue_name: None,
            notes: None,
        })
    }
}

/// Drain every event a finished session sent
pub async fn drain(sink: EventSink, mut rx: tokio::sync::mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
    drop(sink);
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

pub fn vendor_input(id: &str) -> Value {
    json!({ "coupleId": id })
}
