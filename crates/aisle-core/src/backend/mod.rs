//! Planner data collaborators
//!
//! The agent never owns couple or vendor data. It reads it through
//! [`PlannerBackend`], whose implementations live next to the real storage.
//! [`MemoryBackend`] serves JSON fixtures and is what the server binary uses
//! out of the box.

mod extract;
mod memory;

pub use extract::ModelCoupleParser;
pub use memory::{CoupleRecord, Fixtures, MemoryBackend, VendorRecord};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One couple as listed to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupleSummary {
    pub id: String,
    pub share_token: String,
    pub names: String,
    pub date: Option<NaiveDate>,
    pub location: Option<String>,
    pub venue_name: Option<String>,
    pub notes: Option<String>,
}

/// Vendor review status, collapsed to the four values planners act on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VendorStatus {
    Approved,
    Booked,
    Declined,
    #[serde(rename = "Not Reviewed")]
    NotReviewed,
}

impl VendorStatus {
    /// Map a raw stored status onto the normalized set
    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return VendorStatus::NotReviewed;
        };
        match raw.trim().to_lowercase().as_str() {
            "approved" | "yes" => VendorStatus::Approved,
            "booked" | "confirmed" | "contracted" => VendorStatus::Booked,
            "declined" | "rejected" | "no" => VendorStatus::Declined,
            _ => VendorStatus::NotReviewed,
        }
    }
}

/// Vendor line in a couple's detail summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorSummary {
    pub name: String,
    pub category: String,
    pub normalized_status: VendorStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planner_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub couple_note: Option<String>,
}

/// Candidate couple record extracted from free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupleDraft {
    pub names: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub venue_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Data and parsing services the planner tools call into
#[async_trait]
pub trait PlannerBackend: Send + Sync {
    /// All couples visible to the planner
    async fn list_couples(&self) -> Result<Vec<CoupleSummary>>;

    /// Vendor summary for one couple
    async fn couple_vendors(&self, couple_id: &str) -> Result<Vec<VendorSummary>>;

    /// Turn a free-text description into a couple record
    async fn parse_couple(&self, description: &str) -> Result<CoupleDraft>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_normalization() {
        assert_eq!(VendorStatus::normalize(Some("approved")), VendorStatus::Approved);
        assert_eq!(VendorStatus::normalize(Some(" Confirmed ")), VendorStatus::Booked);
        assert_eq!(VendorStatus::normalize(Some("BOOKED")), VendorStatus::Booked);
        assert_eq!(VendorStatus::normalize(Some("rejected")), VendorStatus::Declined);
        assert_eq!(VendorStatus::normalize(Some("maybe")), VendorStatus::NotReviewed);
        assert_eq!(VendorStatus::normalize(None), VendorStatus::NotReviewed);
    }

    #[test]
    fn test_vendor_summary_wire_shape() {
        let summary = VendorSummary {
            name: "Bloom & Vine".into(),
            category: "Florist".into(),
            normalized_status: VendorStatus::NotReviewed,
            planner_note: Some("Call back Tuesday".into()),
            couple_note: None,
        };
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({
                "name": "Bloom & Vine",
                "category": "Florist",
                "normalizedStatus": "Not Reviewed",
                "plannerNote": "Call back Tuesday"
            })
        );
    }
}
