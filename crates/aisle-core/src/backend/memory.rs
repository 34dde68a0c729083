//! In-memory planner data seeded from JSON fixtures

use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CoupleDraft, CoupleSummary, ModelCoupleParser, PlannerBackend, VendorStatus, VendorSummary};
use crate::error::{Error, Result};

/// Fixture file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub couples: Vec<CoupleRecord>,
}

/// Stored couple with its vendors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupleRecord {
    pub id: String,
    pub share_token: String,
    pub names: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub venue_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub vendors: Vec<VendorRecord>,
}

/// Stored vendor with its raw status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorRecord {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub planner_note: Option<String>,
    #[serde(default)]
    pub couple_note: Option<String>,
}

impl CoupleRecord {
    fn summary(&self) -> CoupleSummary {
        CoupleSummary {
            id: self.id.clone(),
            share_token: self.share_token.clone(),
            names: self.names.clone(),
            date: self.date,
            location: self.location.clone(),
            venue_name: self.venue_name.clone(),
            notes: self.notes.clone(),
        }
    }
}

/// Read-only backend over a fixture set
pub struct MemoryBackend {
    fixtures: Fixtures,
    parser: Option<ModelCoupleParser>,
}

impl MemoryBackend {
    pub fn new(fixtures: Fixtures) -> Self {
        Self {
            fixtures,
            parser: None,
        }
    }

    /// Load fixtures from a JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let fixtures: Fixtures = serde_json::from_str(&content)?;
        debug!(couples = fixtures.couples.len(), path = %path.display(), "Loaded planner fixtures");
        Ok(Self::new(fixtures))
    }

    /// Enable free-text parsing through the model
    pub fn with_parser(mut self, parser: ModelCoupleParser) -> Self {
        self.parser = Some(parser);
        self
    }
}

#[async_trait]
impl PlannerBackend for MemoryBackend {
    async fn list_couples(&self) -> Result<Vec<CoupleSummary>> {
        Ok(self.fixtures.couples.iter().map(CoupleRecord::summary).collect())
    }

    async fn couple_vendors(&self, couple_id: &str) -> Result<Vec<VendorSummary>> {
        let couple = self
            .fixtures
            .couples
            .iter()
            .find(|c| c.id == couple_id)
            .ok_or_else(|| Error::Backend(format!("couple not found: {}", couple_id)))?;

        Ok(couple
            .vendors
            .iter()
            .map(|v| VendorSummary {
                name: v.name.clone(),
                category: v.category.clone(),
                normalized_status: VendorStatus::normalize(v.status.as_deref()),
                planner_note: v.planner_note.clone(),
                couple_note: v.couple_note.clone(),
            })
            .collect())
    }

    async fn parse_couple(&self, description: &str) -> Result<CoupleDraft> {
        match &self.parser {
            Some(parser) => parser.parse(description).await,
            None => Err(Error::Backend("description parsing is not configured".to_string())),
        }
    }
}
