//! System prompt management
//!
//! Provides a single source of truth for the assistant's system prompt, with
//! per-request context (today's date and the planner's current view) appended.

use chrono::NaiveDate;

/// System prompt configuration and generation
#[derive(Debug, Clone)]
pub struct SystemPrompt {
    /// Base instructions
    base: String,
    /// Date the model should treat as "today"
    today: Option<NaiveDate>,
    /// App path the planner is looking at
    view: Option<String>,
}

impl SystemPrompt {
    /// Create with custom base prompt
    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            today: None,
            view: None,
        }
    }

    /// Use the local date as "today"
    pub fn with_today(self) -> Self {
        self.with_date(chrono::Local::now().date_naive())
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.today = Some(date);
        self
    }

    /// Add the caller's current view; blank views are ignored
    pub fn with_view(mut self, view: Option<&str>) -> Self {
        self.view = view
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        self
    }

    /// Build the final system prompt
    pub fn build(&self) -> String {
        let mut prompt = self.base.clone();
        if self.today.is_none() && self.view.is_none() {
            return prompt;
        }

        prompt.push_str("\n\n## Context");
        if let Some(today) = self.today {
            prompt.push_str(&format!("\nToday is {} ({}).", today.format("%Y-%m-%d"), today.format("%A")));
        }
        if let Some(view) = &self.view {
            prompt.push_str(&format!("\nThe planner is currently viewing: {}", view));
        }
        prompt
    }
}

/// Default planner-assistant instructions
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are Aisle, an assistant built into a wedding planner's workspace. You help the planner find information about their couples and vendors, and you can open pages or forms for them.

## Available Tools

- list_couples: Every couple the planner manages (id, share token, names, date, location, venue, notes)
- get_couple_vendors: Vendor summary for one couple, by couple id
- parse_couple_details: Turn a free-text description into a structured couple record
- open_couple_modal: Open the new-couple form prefilled with details for the planner to review
- navigate: Open a page in the app (main views, or /planners/couples/{shareToken})

## Guidelines

1. **Look things up**: Never guess names, dates or vendor statuses. Call list_couples to find a couple, then get_couple_vendors with its id.
2. **Creating couples**: When the planner describes a new couple, call parse_couple_details, then open_couple_modal with the result. You cannot save records yourself; the planner confirms in the form.
3. **Navigation**: Only navigate when the planner asks to go somewhere. Use the couple's share token for couple pages.
4. **Answer**: Be brief and specific. Use dates in a readable form and group vendors by status when listing them."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_only() {
        let prompt = SystemPrompt::with_base("Base").build();
        assert_eq!(prompt, "Base");
    }

    #[test]
    fn test_date_and_view_appended() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 13).unwrap();
        let prompt = SystemPrompt::with_base("Base")
            .with_date(date)
            .with_view(Some("/planners/couples"))
            .build();
        assert!(prompt.starts_with("Base\n\n## Context"));
        assert!(prompt.contains("Today is 2026-06-13 (Saturday)."));
        assert!(prompt.contains("currently viewing: /planners/couples"));
    }

    #[test]
    fn test_blank_view_ignored() {
        let prompt = SystemPrompt::with_base("Base").with_view(Some("  ")).build();
        assert_eq!(prompt, "Base");
    }

    #[test]
    fn test_default_mentions_every_tool() {
        for tool in crate::tools::ToolRegistry::standard().list() {
            assert!(DEFAULT_SYSTEM_PROMPT.contains(&tool.name), "missing {}", tool.name);
        }
    }
}
