//! Free-text couple extraction through the language model

use std::sync::Arc;

use tracing::{debug, warn};

use super::CoupleDraft;
use crate::error::{Error, Result};
use crate::provider::{LlmClient, Message};

const EXTRACTION_PROMPT: &str = r#"You extract wedding couple details from a planner's notes.
Reply with a single JSON object and nothing else, using these keys:
- "names": the couple's names, e.g. "Ana & Ben" (required)
- "date": the wedding date as YYYY-MM-DD, or null
- "location": city or region, or null
- "venueName": the venue, or null
- "notes": anything else worth keeping, or null"#;

/// Parses descriptions by asking the model for a JSON record
#[derive(Clone)]
pub struct ModelCoupleParser {
    client: Arc<dyn LlmClient>,
}

impl ModelCoupleParser {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub async fn parse(&self, description: &str) -> Result<CoupleDraft> {
        let messages = [Message::user(description)];
        let completion = self.client.complete(EXTRACTION_PROMPT, &[], &messages).await?;
        let text = completion.content.unwrap_or_default();

        let draft = extract_draft(&text).ok_or_else(|| {
            warn!(model = %self.client.model(), "Model reply did not contain a couple record");
            Error::Backend("could not extract couple details from description".to_string())
        })?;

        debug!(names = %draft.names, "Extracted couple draft");
        Ok(draft)
    }
}

/// Pull the outermost JSON object out of a model reply
fn extract_draft(text: &str) -> Option<CoupleDraft> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    let draft: CoupleDraft = serde_json::from_str(&text[start..=end]).ok()?;
    if draft.names.trim().is_empty() {
        return None;
    }
    Some(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Completion, TextStream};
    use crate::tools::ToolDefinition;
    use async_trait::async_trait;

    struct CannedClient(String);

    #[async_trait]
    impl LlmClient for CannedClient {
        fn model(&self) -> &str {
            "canned"
        }

        async fn complete(&self, _: &str, _: &[ToolDefinition], _: &[Message]) -> Result<Completion> {
            Ok(Completion::text(self.0.clone()))
        }

        async fn stream_complete(&self, _: &str, _: &[ToolDefinition], _: &[Message]) -> Result<TextStream> {
            Err(Error::Provider("not used".into()))
        }
    }

    #[test]
    fn test_extract_from_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"names\": \"Ana & Ben\", \"date\": \"2026-06-20\", \"venueName\": \"Harbor Hall\"}\n```";
        let draft = extract_draft(reply).unwrap();
        assert_eq!(draft.names, "Ana & Ben");
        assert_eq!(draft.venue_name.as_deref(), Some("Harbor Hall"));
        assert!(draft.location.is_none());
    }

    #[test]
    fn test_extract_rejects_missing_names() {
        assert!(extract_draft("{\"names\": \"  \"}").is_none());
        assert!(extract_draft("no json here").is_none());
        assert!(extract_draft("} backwards {").is_none());
    }

    #[tokio::test]
    async fn test_parse_through_client() {
        let parser = ModelCoupleParser::new(Arc::new(CannedClient(
            "{\"names\": \"Kim & Lee\", \"location\": \"Lisbon\"}".into(),
        )));
        let draft = parser.parse("Kim and Lee, Lisbon next spring").await.unwrap();
        assert_eq!(draft.location.as_deref(), Some("Lisbon"));

        let parser = ModelCoupleParser::new(Arc::new(CannedClient("I'm not sure.".into())));
        let err = parser.parse("???").await.unwrap_err();
        assert!(err.to_string().contains("could not extract"));
    }
}
