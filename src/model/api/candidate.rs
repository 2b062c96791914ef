use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::db::Candidate;

use super::{ApiId, Patch, PositionSummary};

/// A candidate as submitted by an administrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub position_id: Option<String>,
}

/// A partial update to a candidate. Absent fields are left unchanged;
/// `null` clears the clearable ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub image_id: Patch<String>,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub position_id: Patch<String>,
}

/// API-friendly view of a stored candidate, with its position resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDescription {
    pub id: ApiId,
    pub name: String,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub order: i32,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CandidateDescription {
    pub fn new(candidate: Candidate, position: Option<PositionSummary>) -> Self {
        Self {
            id: candidate.id.into(),
            name: candidate.candidate.name,
            description: candidate.candidate.description,
            image_id: candidate.candidate.image_id,
            order: candidate.candidate.order,
            is_active: candidate.candidate.is_active,
            position,
            created_at: candidate.candidate.created_at,
            updated_at: candidate.candidate.updated_at,
        }
    }
}
