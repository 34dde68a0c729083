//! UI-directed tool effects
//!
//! Two tools produce a [`PendingAction`] instead of (or besides) data: the
//! couple form prefill, and in-app navigation. Navigation targets are
//! checked against an allow-list so the model cannot send the browser to an
//! arbitrary location.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use super::ToolOutput;
use crate::error::ToolError;

/// Top-level views the assistant may open
pub const KNOWN_VIEWS: &[&str] = &[
    "/planners",
    "/planners/couples",
    "/planners/vendors",
    "/planners/invitations",
    "/planners/settings",
];

/// `/<section>[/<section>...]/couples/<token>`, token limited to `[A-Za-z0-9_-]`
static COUPLE_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:/[A-Za-z0-9_-]+)+/couples/[A-Za-z0-9_-]+$").expect("valid couple page pattern")
});

/// Kind of side effect handed to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    OpenCoupleModal,
    Navigate,
}

/// Side effect for the caller to apply once the answer is complete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub payload: Value,
}

impl PendingAction {
    pub fn open_couple_modal(prefill: Value) -> Self {
        Self {
            kind: ActionKind::OpenCoupleModal,
            payload: prefill,
        }
    }

    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Navigate,
            payload: json!({ "url": url.into() }),
        }
    }
}

/// Whether a navigation target is allowed
pub fn is_allowed_path(path: &str) -> bool {
    KNOWN_VIEWS.contains(&path) || COUPLE_PAGE.is_match(path)
}

/// Package the prefill verbatim; always succeeds
pub fn open_couple_modal(prefill: Value) -> ToolOutput {
    ToolOutput::data(json!({ "opened": true }))
        .with_action(PendingAction::open_couple_modal(prefill))
}

/// Validate a navigation target and produce the action
pub fn navigate(url: &str) -> Result<ToolOutput, ToolError> {
    if !is_allowed_path(url) {
        warn!(url = %url, "Rejected navigation target");
        return Err(ToolError::Rejected(format!("navigation to '{}' is not allowed", url)));
    }
    Ok(ToolOutput::data(json!({ "navigatingTo": url })).with_action(PendingAction::navigate(url)))
}
