//! LLM request/response logging
//!
//! Set the `LLM_LOG_FILE` environment variable to append one JSON line per
//! model call. Nothing is written when the variable is unset.

use serde_json::json;
use std::io::Write;
use tracing::{debug, warn};

use super::{Completion, Message};
use crate::tools::ToolDefinition;

/// What to include in the log entry
#[derive(Default)]
pub struct LogConfig<'a> {
    pub model: &'a str,
    /// Provider name (e.g., "anthropic")
    pub provider: Option<&'a str>,
    pub system_prompt: Option<&'a str>,
    pub messages: &'a [Message],
    pub tools: Option<&'a [ToolDefinition]>,
    /// Parsed completion; `None` for streaming calls and failures
    pub result: Option<&'a Completion>,
    pub error: Option<&'a str>,
}

/// Append an interaction to the file named by `LLM_LOG_FILE`
pub fn log_llm_interaction(config: LogConfig<'_>) {
    let log_file = match std::env::var("LLM_LOG_FILE") {
        Ok(path) => path,
        Err(_) => return,
    };

    let entry = json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "model": config.model,
        "provider": config.provider,
        "request": {
            "system_prompt_len": config.system_prompt.map(str::len),
            "messages": config.messages,
            "message_count": config.messages.len(),
            "tool_count": config.tools.map(|t| t.len()).unwrap_or(0),
        },
        "response": config.result.map(|r| json!({
            "type": if r.has_tool_calls() { "tool_calls" } else { "message" },
            "content": r.content,
            "tool_calls": r.tool_calls,
            "stop_reason": r.stop_reason,
        })),
        "error": config.error,
    });

    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
    {
        Ok(mut file) => {
            if let Err(e) = writeln!(file, "{}", entry) {
                warn!("Failed to write to LLM log file: {}", e);
            }
        }
        Err(e) => {
            warn!("Failed to open LLM log file {}: {}", log_file, e);
        }
    }

    debug!("Logged LLM interaction to {}", log_file);
}
