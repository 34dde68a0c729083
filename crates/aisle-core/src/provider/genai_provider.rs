//! GenAI-based LLM client implementation
//!
//! Uses the genai framework so the assistant can run against any provider it
//! supports. Both call modes go through `exec_chat_stream`: the blocking
//! mode accumulates the stream to avoid request timeouts on long turns.
//!
//! ## LLM Request/Response Logging
//!
//! Set the `LLM_LOG_FILE` environment variable to append one JSON line per
//! model call. Example: `LLM_LOG_FILE=/tmp/llm.log aisle-server`

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest, ChatStreamEvent, Tool, ToolCall, ToolResponse};
use genai::resolver::{AuthData, AuthResolver};
use genai::{Client, WebConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use super::logging::{log_llm_interaction, LogConfig};
use super::{Completion, LlmClient, Message, Role, StopReason, TextStream, ToolCallRequest};
use crate::error::{Error, Result};
use crate::tools::ToolDefinition;

/// Supported LLM provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// OpenAI (GPT-4o, etc.)
    OpenAI,
    /// Anthropic (Claude)
    Anthropic,
    /// Google Gemini
    Gemini,
    /// Groq (fast inference)
    Groq,
    /// DeepSeek
    DeepSeek,
    /// Ollama (local)
    Ollama,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAI),
            "anthropic" => Ok(ProviderType::Anthropic),
            "gemini" | "google" => Ok(ProviderType::Gemini),
            "groq" => Ok(ProviderType::Groq),
            "deepseek" => Ok(ProviderType::DeepSeek),
            "ollama" => Ok(ProviderType::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl ProviderType {
    /// Get the default model for this provider
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "gpt-4o",
            ProviderType::Anthropic => "claude-sonnet-4-5-20250929",
            ProviderType::Gemini => "gemini-2.0-flash",
            ProviderType::Groq => "llama-3.3-70b-versatile",
            ProviderType::DeepSeek => "deepseek-chat",
            ProviderType::Ollama => "llama3.2",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Anthropic => "anthropic",
            ProviderType::Gemini => "gemini",
            ProviderType::Groq => "groq",
            ProviderType::DeepSeek => "deepseek",
            ProviderType::Ollama => "ollama",
        }
    }
}

/// A client implementation using genai
pub struct GenAIClient {
    client: Client,
    provider_type: ProviderType,
    model: String,
}

impl GenAIClient {
    /// Default timeout for LLM API requests (5 minutes)
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    /// Create WebConfig with appropriate timeouts for LLM requests
    fn default_web_config() -> WebConfig {
        WebConfig::default()
            .with_timeout(Self::DEFAULT_TIMEOUT)
            .with_connect_timeout(Duration::from_secs(30))
    }

    /// Create a new client with default settings (uses environment variables for auth)
    pub fn new(provider_type: ProviderType, model: Option<&str>) -> Self {
        let client = Client::builder()
            .with_web_config(Self::default_web_config())
            .build();
        Self {
            client,
            provider_type,
            model: model.unwrap_or(provider_type.default_model()).to_string(),
        }
    }

    /// Create a client with a specific API key
    pub fn with_api_key(provider_type: ProviderType, api_key: &str, model: Option<&str>) -> Self {
        let api_key = api_key.to_string();
        let auth_resolver = AuthResolver::from_resolver_fn(
            move |_model_iden| -> std::result::Result<Option<AuthData>, genai::resolver::Error> {
                Ok(Some(AuthData::from_single(api_key.clone())))
            },
        );

        let client = Client::builder()
            .with_web_config(Self::default_web_config())
            .with_auth_resolver(auth_resolver)
            .build();

        Self {
            client,
            provider_type,
            model: model.unwrap_or(provider_type.default_model()).to_string(),
        }
    }

    /// Build a genai request from our history
    fn build_request(system: &str, tools: &[ToolDefinition], messages: &[Message]) -> ChatRequest {
        let mut chat_req = ChatRequest::default().with_system(system);

        for msg in messages {
            chat_req = match msg {
                Message::Text { role: Role::User, content } => {
                    chat_req.append_message(ChatMessage::user(content.as_str()))
                }
                Message::Text { role: Role::Assistant, content } => {
                    chat_req.append_message(ChatMessage::assistant(content.as_str()))
                }
                Message::ToolCalls { calls, .. } => {
                    // Tool calls must be a single assistant message for OpenAI-style APIs
                    let genai_tool_calls: Vec<ToolCall> = calls
                        .iter()
                        .map(|call| ToolCall {
                            call_id: call.id.clone(),
                            fn_name: call.name.clone(),
                            fn_arguments: call.input.clone(),
                            thought_signatures: None,
                        })
                        .collect();
                    chat_req.append_message(genai_tool_calls)
                }
                Message::ToolResults { results } => {
                    let mut req = chat_req;
                    for result in results {
                        let tool_response = ToolResponse::new(result.id.clone(), result.payload.to_string());
                        req = req.append_message(tool_response);
                    }
                    req
                }
            };
        }

        if tools.is_empty() {
            return chat_req;
        }

        let genai_tools: Vec<Tool> = tools
            .iter()
            .map(|t| {
                Tool::new(&t.name)
                    .with_description(&t.description)
                    .with_schema(t.parameters.clone())
            })
            .collect();
        chat_req.with_tools(genai_tools)
    }

    fn log(
        &self,
        system: &str,
        tools: &[ToolDefinition],
        messages: &[Message],
        result: Option<&Completion>,
        error: Option<&str>,
    ) {
        log_llm_interaction(LogConfig {
            model: &self.model,
            provider: Some(self.provider_type.as_str()),
            system_prompt: Some(system),
            messages,
            tools: Some(tools),
            result,
            error,
        });
    }
}

/// Tool call arguments may arrive as a JSON-encoded string
fn normalize_arguments(arguments: Value) -> Value {
    match arguments {
        Value::String(raw) if raw.trim().is_empty() => Value::Object(Default::default()),
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        Value::Null => Value::Object(Default::default()),
        other => other,
    }
}

/// Folds the events of one streamed turn into a [`Completion`]
///
/// Tool call chunks may carry accumulated arguments, so the latest chunk per
/// call id wins while ids keep the order they were first seen in.
#[derive(Default)]
struct CompletionBuilder {
    content: String,
    order: Vec<String>,
    calls: HashMap<String, ToolCall>,
}

impl CompletionBuilder {
    fn push_text(&mut self, text: &str) {
        self.content.push_str(text);
    }

    fn push_call(&mut self, call: ToolCall) {
        if !self.calls.contains_key(&call.call_id) {
            self.order.push(call.call_id.clone());
        }
        self.calls.insert(call.call_id.clone(), call);
    }

    fn finish(mut self) -> Completion {
        let tool_calls: Vec<ToolCallRequest> = self
            .order
            .into_iter()
            .filter_map(|id| self.calls.remove(&id))
            .filter(|tc| !tc.fn_name.is_empty())
            .map(|tc| ToolCallRequest {
                id: tc.call_id,
                name: tc.fn_name,
                input: normalize_arguments(tc.fn_arguments),
            })
            .collect();

        let stop_reason = if tool_calls.is_empty() {
            StopReason::EndTurn
        } else {
            StopReason::ToolUse
        };

        Completion {
            content: if self.content.is_empty() { None } else { Some(self.content) },
            tool_calls,
            stop_reason,
        }
    }
}

#[async_trait]
impl LlmClient for GenAIClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system: &str,
        tools: &[ToolDefinition],
        messages: &[Message],
    ) -> Result<Completion> {
        let chat_req = Self::build_request(system, tools, messages);
        let options = ChatOptions::default().with_capture_tool_calls(true);

        let stream_response = match self
            .client
            .exec_chat_stream(&self.model, chat_req, Some(&options))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let error_msg = format!("GenAI error: {:?}", e);
                self.log(system, tools, messages, None, Some(&error_msg));
                error!(error = ?e, model = %self.model, "LLM request failed");
                return Err(Error::Provider(error_msg));
            }
        };

        let mut builder = CompletionBuilder::default();
        let mut stream = stream_response.stream;

        while let Some(event) = stream.next().await {
            match event {
                Ok(ChatStreamEvent::Chunk(chunk)) => builder.push_text(&chunk.content),
                Ok(ChatStreamEvent::ToolCallChunk(tc)) => builder.push_call(tc.tool_call),
                Ok(ChatStreamEvent::End(end)) => {
                    if let Some(captured) = end.captured_tool_calls() {
                        for tc in captured {
                            builder.push_call(tc.clone());
                        }
                    }
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    let error_msg = format!("GenAI stream error: {:?}", e);
                    self.log(system, tools, messages, None, Some(&error_msg));
                    error!(error = ?e, model = %self.model, "LLM stream error");
                    return Err(Error::Provider(error_msg));
                }
            }
        }

        let completion = builder.finish();

        debug!(
            model = %self.model,
            tool_calls = completion.tool_calls.len(),
            "LLM completion finished"
        );
        self.log(system, tools, messages, Some(&completion), None);

        Ok(completion)
    }

    async fn stream_complete(
        &self,
        system: &str,
        tools: &[ToolDefinition],
        messages: &[Message],
    ) -> Result<TextStream> {
        let chat_req = Self::build_request(system, tools, messages);

        let stream_response = self
            .client
            .exec_chat_stream(&self.model, chat_req, None)
            .await
            .map_err(|e| {
                let error_msg = format!("GenAI error: {:?}", e);
                self.log(system, tools, messages, None, Some(&error_msg));
                error!(error = ?e, model = %self.model, "LLM streaming request failed");
                Error::Provider(error_msg)
            })?;

        self.log(system, tools, messages, None, None);

        let model = self.model.clone();
        let text = stream_response.stream.filter_map(move |event| {
            let item = match event {
                Ok(ChatStreamEvent::Chunk(chunk)) if !chunk.content.is_empty() => Some(Ok(chunk.content)),
                Ok(_) => None,
                Err(e) => {
                    error!(error = ?e, model = %model, "LLM stream error");
                    Some(Err(Error::Provider(format!("GenAI stream error: {:?}", e))))
                }
            };
            futures::future::ready(item)
        });

        Ok(text.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!("anthropic".parse::<ProviderType>().unwrap(), ProviderType::Anthropic);
        assert_eq!("Google".parse::<ProviderType>().unwrap(), ProviderType::Gemini);
        assert!("nonexistent".parse::<ProviderType>().is_err());
    }

    #[test]
    fn test_normalize_arguments() {
        assert_eq!(normalize_arguments(json!("{\"url\":\"/planners\"}")), json!({"url": "/planners"}));
        assert_eq!(normalize_arguments(json!("")), json!({}));
        assert_eq!(normalize_arguments(Value::Null), json!({}));
        assert_eq!(normalize_arguments(json!({"coupleId": "c1"})), json!({"coupleId": "c1"}));
    }

    fn chunk(id: &str, name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            call_id: id.to_string(),
            fn_name: name.to_string(),
            fn_arguments: arguments,
            thought_signatures: None,
        }
    }

    #[test]
    fn test_builder_text_only() {
        let mut builder = CompletionBuilder::default();
        builder.push_text("Ana & Ben ");
        builder.push_text("marry in June.");
        let completion = builder.finish();

        assert_eq!(completion, Completion::text("Ana & Ben marry in June."));
    }

    #[test]
    fn test_builder_empty_turn() {
        let completion = CompletionBuilder::default().finish();
        assert_eq!(completion.content, None);
        assert!(completion.tool_calls.is_empty());
        assert_eq!(completion.stop_reason, StopReason::EndTurn);
    }

    #[test]
    fn test_builder_latest_chunk_per_id_wins() {
        let mut builder = CompletionBuilder::default();
        builder.push_call(chunk("a", "navigate", json!("{\"url\":")));
        builder.push_call(chunk("b", "list_couples", Value::Null));
        builder.push_call(chunk("a", "navigate", json!("{\"url\":\"/planners\"}")));
        let completion = builder.finish();

        assert_eq!(completion.stop_reason, StopReason::ToolUse);
        let ids: Vec<_> = completion.tool_calls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(completion.tool_calls[0].input, json!({"url": "/planners"}));
        assert_eq!(completion.tool_calls[1].input, json!({}));
    }

    #[test]
    fn test_builder_end_repeats_seen_ids() {
        let mut builder = CompletionBuilder::default();
        builder.push_text("Checking");
        builder.push_call(chunk("a", "get_couple_vendors", json!("{\"couple")));
        // End event replays every captured call, plus one never chunked
        builder.push_call(chunk("a", "get_couple_vendors", json!({"coupleId": "c1"})));
        builder.push_call(chunk("c", "list_couples", json!({})));
        let completion = builder.finish();

        assert_eq!(completion.content.as_deref(), Some("Checking"));
        assert_eq!(completion.tool_calls.len(), 2);
        assert_eq!(completion.tool_calls[0].id, "a");
        assert_eq!(completion.tool_calls[0].input, json!({"coupleId": "c1"}));
        assert_eq!(completion.tool_calls[1].id, "c");
    }

    #[test]
    fn test_builder_drops_nameless_calls() {
        let mut builder = CompletionBuilder::default();
        builder.push_call(chunk("a", "", json!({})));
        let completion = builder.finish();

        assert!(completion.tool_calls.is_empty());
        assert_eq!(completion.stop_reason, StopReason::EndTurn);
        assert!(completion.is_final());
    }

    #[test]
    fn test_default_model_fallback() {
        let client = GenAIClient::new(ProviderType::OpenAI, None);
        assert_eq!(client.model(), "gpt-4o");

        let client = GenAIClient::new(ProviderType::Anthropic, Some("claude-3-5-haiku-latest"));
        assert_eq!(client.model(), "claude-3-5-haiku-latest");
    }
}
