use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{
    db::{Candidate, NewCandidate, NewPosition, NewVote, Position, Vote},
    mongodb::Id,
};

/// Shared handle on whichever store backs the server. Lives in managed state.
pub type Store = Arc<dyn ElectionStore>;

/// Outcome of a guarded delete.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Removal {
    Removed,
    Missing,
    /// Something still refers to the entity, so it was left in place.
    Referenced,
}

/// Which candidates to list.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    pub position_id: Option<Id>,
    pub active_only: bool,
}

impl CandidateFilter {
    pub fn active() -> Self {
        Self {
            position_id: None,
            active_only: true,
        }
    }

    /// Does the given candidate pass this filter?
    pub fn matches(&self, candidate: &Candidate) -> bool {
        (!self.active_only || candidate.is_active)
            && self
                .position_id
                .map_or(true, |id| candidate.position_id == Some(id))
    }
}

/// Which tallies to list. Both criteria apply when both are set.
#[derive(Debug, Clone, Default)]
pub struct VoteFilter {
    pub mesa: Option<String>,
    pub candidate_id: Option<Id>,
}

impl VoteFilter {
    pub fn matches(&self, vote: &Vote) -> bool {
        self.mesa.as_ref().map_or(true, |mesa| &vote.mesa == mesa)
            && self
                .candidate_id
                .map_or(true, |id| vote.candidate_id == id)
    }
}

/// Persistent storage for positions, candidates and tallies.
///
/// Implementations own the uniqueness rules: `insert_vote` must reject a
/// second tally for the same (mesa, candidate) pair with
/// [`Conflict::DuplicateVote`](crate::error::Conflict::DuplicateVote), and
/// position inserts/replacements must reject a name already in use, in a way
/// that holds under concurrent callers. Tally inserts and candidate writes
/// fail with [`Error::NotFound`](crate::error::Error::NotFound) when the
/// candidate or position they refer to is gone, where the backend can check
/// that atomically with the write.
#[rocket::async_trait]
pub trait ElectionStore: Send + Sync {
    async fn insert_position(&self, position: NewPosition) -> Result<Position>;

    /// Overwrite the stored position with the same ID. Returns `false` if there was none.
    async fn replace_position(&self, position: &Position) -> Result<bool>;

    /// Delete a position unless a candidate still refers to it.
    async fn remove_position(&self, id: Id) -> Result<Removal>;

    async fn find_position(&self, id: Id) -> Result<Option<Position>>;

    async fn find_positions(&self, active_only: bool) -> Result<Vec<Position>>;

    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate>;

    /// Overwrite the stored candidate with the same ID. Returns `false` if there was none.
    async fn replace_candidate(&self, candidate: &Candidate) -> Result<bool>;

    /// Delete a candidate unless tallies still refer to it.
    async fn remove_candidate(&self, id: Id) -> Result<Removal>;

    async fn find_candidate(&self, id: Id) -> Result<Option<Candidate>>;

    async fn find_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>>;

    async fn insert_vote(&self, vote: NewVote) -> Result<Vote>;

    /// Set the count of an existing tally, returning the updated tally if it exists.
    async fn set_vote_count(
        &self,
        id: Id,
        vote_count: u32,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Vote>>;

    /// Returns `false` if there was no such tally.
    async fn remove_vote(&self, id: Id) -> Result<bool>;

    async fn find_vote(&self, id: Id) -> Result<Option<Vote>>;

    async fn find_votes(&self, filter: &VoteFilter) -> Result<Vec<Vote>>;

    /// Sum of `vote_count` grouped by candidate. Candidates without tallies are absent.
    async fn vote_totals(&self) -> Result<HashMap<Id, u64>>;
}
