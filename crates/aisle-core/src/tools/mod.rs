//! Tool system for the planner assistant
//!
//! Tools are the actions the model can request mid-conversation. Each tool
//! has:
//! - A name and description for the LLM
//! - A JSON schema for its input
//! - A typed [`ToolInvocation`] variant the dispatcher executes
//!
//! The set is fixed; [`ToolRegistry::standard`] declares all five.

pub mod actions;
mod dispatcher;

pub use actions::{ActionKind, PendingAction};
pub use dispatcher::{ToolDispatcher, ToolOutcome};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ToolError;

pub const LIST_COUPLES: &str = "list_couples";
pub const GET_COUPLE_VENDORS: &str = "get_couple_vendors";
pub const PARSE_COUPLE_DETAILS: &str = "parse_couple_details";
pub const OPEN_COUPLE_MODAL: &str = "open_couple_modal";
pub const NAVIGATE: &str = "navigate";

/// Tool definition for LLM consumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    fn new(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }
}

/// Output from a tool execution
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Data returned to the model
    pub content: Value,
    /// UI side effect requested by the tool, if any
    pub action: Option<PendingAction>,
}

impl ToolOutput {
    pub fn data(content: impl Into<Value>) -> Self {
        Self {
            content: content.into(),
            action: None,
        }
    }

    pub fn with_action(mut self, action: PendingAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Registry of tool contracts shared with the model on every call
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ToolRegistry {
    /// The five planner tools
    pub fn standard() -> Self {
        let definitions = vec![
            ToolDefinition::new(
                LIST_COUPLES,
                "List every couple the planner manages, with id, share token, names, wedding date, location, venue and notes. Call this first to find a couple's id.",
                json!({
                    "type": "object",
                    "properties": {},
                }),
            ),
            ToolDefinition::new(
                GET_COUPLE_VENDORS,
                "Summarize the vendors for one couple: name, category, status (Approved, Booked, Declined or Not Reviewed) and any planner or couple notes.",
                json!({
                    "type": "object",
                    "properties": {
                        "coupleId": {
                            "type": "string",
                            "description": "The couple id returned by list_couples"
                        }
                    },
                    "required": ["coupleId"]
                }),
            ),
            ToolDefinition::new(
                PARSE_COUPLE_DETAILS,
                "Extract a structured couple record (names, date, location, venue, notes) from a free-text description the planner pasted or typed.",
                json!({
                    "type": "object",
                    "properties": {
                        "description": {
                            "type": "string",
                            "description": "The free-text description of the couple"
                        }
                    },
                    "required": ["description"]
                }),
            ),
            ToolDefinition::new(
                OPEN_COUPLE_MODAL,
                "Open the new-couple form in the planner's browser, prefilled with the given fields. The planner reviews and saves it; nothing is created by this tool.",
                json!({
                    "type": "object",
                    "properties": {
                        "names": { "type": "string", "description": "Couple names, e.g. \"Ana & Ben\"" },
                        "date": { "type": "string", "description": "Wedding date as YYYY-MM-DD" },
                        "location": { "type": "string", "description": "City or region" },
                        "venueName": { "type": "string", "description": "Venue name" },
                        "notes": { "type": "string", "description": "Additional notes" }
                    },
                    "required": ["names"]
                }),
            ),
            ToolDefinition::new(
                NAVIGATE,
                "Send the planner's browser to a page in the app: one of the main views (/planners, /planners/couples, /planners/vendors, /planners/invitations, /planners/settings) or a couple page such as /planners/couples/{shareToken}.",
                json!({
                    "type": "object",
                    "properties": {
                        "url": {
                            "type": "string",
                            "description": "App-relative path to open"
                        }
                    },
                    "required": ["url"]
                }),
            ),
        ];
        Self { definitions }
    }

    /// Definitions in declaration order
    pub fn list(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoupleVendorsInput {
    couple_id: String,
}

#[derive(Debug, Deserialize)]
struct ParseCoupleInput {
    description: String,
}

#[derive(Debug, Deserialize)]
struct NavigateInput {
    url: String,
}

/// A validated tool invocation, one variant per tool
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    ListCouples,
    CoupleVendors { couple_id: String },
    ParseCouple { description: String },
    /// Prefill payload, passed through verbatim
    OpenCoupleModal { prefill: Value },
    Navigate { url: String },
}

impl ToolInvocation {
    /// Resolve a model request into a typed invocation
    pub fn parse(name: &str, input: Value) -> Result<Self, ToolError> {
        let input = if input.is_null() { json!({}) } else { input };
        match name {
            LIST_COUPLES => Ok(Self::ListCouples),
            GET_COUPLE_VENDORS => {
                let input: CoupleVendorsInput = decode(name, input)?;
                Ok(Self::CoupleVendors {
                    couple_id: input.couple_id,
                })
            }
            PARSE_COUPLE_DETAILS => {
                let input: ParseCoupleInput = decode(name, input)?;
                Ok(Self::ParseCouple {
                    description: input.description,
                })
            }
            OPEN_COUPLE_MODAL => Ok(Self::OpenCoupleModal { prefill: input }),
            NAVIGATE => {
                let input: NavigateInput = decode(name, input)?;
                Ok(Self::Navigate { url: input.url })
            }
            other => Err(ToolError::NotFound(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ListCouples => LIST_COUPLES,
            Self::CoupleVendors { .. } => GET_COUPLE_VENDORS,
            Self::ParseCouple { .. } => PARSE_COUPLE_DETAILS,
            Self::OpenCoupleModal { .. } => OPEN_COUPLE_MODAL,
            Self::Navigate { .. } => NAVIGATE,
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(tool: &str, input: Value) -> Result<T, ToolError> {
    serde_json::from_value(input).map_err(|e| ToolError::InvalidParams {
        tool: tool.to_string(),
        detail: e.to_string(),
    })
}
