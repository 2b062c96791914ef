use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{common::VoteType, db::Vote};

use super::{ApiId, PositionSummary};

/// A tally as submitted for recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSpec {
    pub mesa: String,
    pub candidate_id: String,
    /// Signed so that negative counts reach validation instead of failing to parse.
    pub vote_count: i64,
    #[serde(default)]
    pub vote_type: Option<String>,
}

/// A correction to an existing tally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePatch {
    #[serde(default)]
    pub vote_count: Option<i64>,
}

/// A stored tally, hydrated with the candidate's name and position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteDescription {
    pub id: ApiId,
    pub mesa: String,
    pub candidate_id: ApiId,
    /// Missing only if the candidate has since disappeared from the registry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionSummary>,
    pub vote_count: u32,
    pub vote_type: VoteType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VoteDescription {
    pub fn new(
        vote: Vote,
        candidate_name: Option<String>,
        position: Option<PositionSummary>,
    ) -> Self {
        Self {
            id: vote.id.into(),
            mesa: vote.vote.mesa,
            candidate_id: vote.vote.candidate_id.into(),
            candidate_name,
            position,
            vote_count: vote.vote.vote_count,
            vote_type: vote.vote.vote_type,
            created_at: vote.vote.created_at,
            updated_at: vote.vote.updated_at,
        }
    }
}
