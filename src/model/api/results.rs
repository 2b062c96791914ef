use serde::{Deserialize, Serialize};

use super::ApiId;

/// Aggregated votes for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResult {
    pub candidate_id: ApiId,
    pub candidate_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_id: Option<ApiId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_name: Option<String>,
    pub total_votes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
}

/// All candidate results plus grand totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsSummary {
    pub total_candidates: usize,
    pub total_votes: u64,
    pub results: Vec<CandidateResult>,
}

/// The configured validity threshold of a position. Not a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionThreshold {
    pub position_id: ApiId,
    pub name: String,
    pub total_votes_expected: u32,
    /// `valid_percentage` scaled to a whole percentage.
    pub valid_percentage: u32,
}
