use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpertProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub expertise: Vec<String>,
    #[serde(default)]
    pub available: Option<bool>,
}

/// One past or current claim of a conversation by an expert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpertAssignment {
    pub id: String,
    pub conversation_id: String,
    #[serde(default)]
    pub expert_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Profile fields an expert may change. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateExpertProfileRequest {
    pub bio: Option<String>,
    pub expertise: Option<Vec<String>>,
    pub available: Option<bool>,
}
