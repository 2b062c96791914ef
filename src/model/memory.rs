use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rocket::tokio::sync::RwLock;

use crate::error::{Conflict, Error, Result};
use crate::model::{
    db::{Candidate, NewCandidate, NewPosition, NewVote, Position, Vote},
    mongodb::Id,
    store::{CandidateFilter, ElectionStore, Removal, VoteFilter},
};

/// All tables behind a single lock. Every write re-checks the references and
/// uniqueness rules it depends on while holding the write guard.
///
/// `Id`s order by creation, so iterating a `BTreeMap` gives insertion order,
/// matching MongoDB's natural order.
#[derive(Debug, Default)]
struct Tables {
    positions: BTreeMap<Id, Position>,
    candidates: BTreeMap<Id, Candidate>,
    votes: BTreeMap<Id, Vote>,
}

impl Tables {
    fn name_taken(&self, name: &str, except: Option<Id>) -> bool {
        self.positions
            .values()
            .any(|p| p.name == name && Some(p.id) != except)
    }

    fn check_position(&self, position_id: Option<Id>) -> Result<()> {
        match position_id {
            Some(id) if !self.positions.contains_key(&id) => {
                Err(Error::not_found(format!("Position {id}")))
            }
            _ => Ok(()),
        }
    }
}

/// A process-local store. Used by tests and for running without a database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl ElectionStore for MemoryStore {
    async fn insert_position(&self, position: NewPosition) -> Result<Position> {
        let mut tables = self.tables.write().await;
        if tables.name_taken(&position.name, None) {
            return Err(Error::Conflict(Conflict::DuplicatePositionName(
                position.name,
            )));
        }
        let position = Position {
            id: Id::new(),
            position,
        };
        tables.positions.insert(position.id, position.clone());
        Ok(position)
    }

    async fn replace_position(&self, position: &Position) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if !tables.positions.contains_key(&position.id) {
            return Ok(false);
        }
        if tables.name_taken(&position.name, Some(position.id)) {
            return Err(Error::Conflict(Conflict::DuplicatePositionName(
                position.name.clone(),
            )));
        }
        tables.positions.insert(position.id, position.clone());
        Ok(true)
    }

    async fn remove_position(&self, id: Id) -> Result<Removal> {
        let mut tables = self.tables.write().await;
        if !tables.positions.contains_key(&id) {
            return Ok(Removal::Missing);
        }
        if tables
            .candidates
            .values()
            .any(|c| c.position_id == Some(id))
        {
            return Ok(Removal::Referenced);
        }
        tables.positions.remove(&id);
        Ok(Removal::Removed)
    }

    async fn find_position(&self, id: Id) -> Result<Option<Position>> {
        Ok(self.tables.read().await.positions.get(&id).cloned())
    }

    async fn find_positions(&self, active_only: bool) -> Result<Vec<Position>> {
        let tables = self.tables.read().await;
        Ok(tables
            .positions
            .values()
            .filter(|p| !active_only || p.is_active)
            .cloned()
            .collect())
    }

    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate> {
        let mut tables = self.tables.write().await;
        tables.check_position(candidate.position_id)?;
        let candidate = Candidate {
            id: Id::new(),
            candidate,
        };
        tables.candidates.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    async fn replace_candidate(&self, candidate: &Candidate) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if !tables.candidates.contains_key(&candidate.id) {
            return Ok(false);
        }
        tables.check_position(candidate.position_id)?;
        match tables.candidates.get_mut(&candidate.id) {
            Some(existing) => {
                *existing = candidate.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_candidate(&self, id: Id) -> Result<Removal> {
        let mut tables = self.tables.write().await;
        if !tables.candidates.contains_key(&id) {
            return Ok(Removal::Missing);
        }
        if tables.votes.values().any(|v| v.candidate_id == id) {
            return Ok(Removal::Referenced);
        }
        tables.candidates.remove(&id);
        Ok(Removal::Removed)
    }

    async fn find_candidate(&self, id: Id) -> Result<Option<Candidate>> {
        Ok(self.tables.read().await.candidates.get(&id).cloned())
    }

    async fn find_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>> {
        let tables = self.tables.read().await;
        Ok(tables
            .candidates
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    async fn insert_vote(&self, vote: NewVote) -> Result<Vote> {
        // Check and insert under one write guard.
        let mut tables = self.tables.write().await;
        if !tables.candidates.contains_key(&vote.candidate_id) {
            return Err(Error::not_found(format!("Candidate {}", vote.candidate_id)));
        }
        let duplicate = tables
            .votes
            .values()
            .any(|v| v.mesa == vote.mesa && v.candidate_id == vote.candidate_id);
        if duplicate {
            return Err(Error::Conflict(Conflict::DuplicateVote {
                mesa: vote.mesa,
                candidate_id: vote.candidate_id,
            }));
        }
        let vote = Vote {
            id: Id::new(),
            vote,
        };
        tables.votes.insert(vote.id, vote.clone());
        Ok(vote)
    }

    async fn set_vote_count(
        &self,
        id: Id,
        vote_count: u32,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Vote>> {
        let mut tables = self.tables.write().await;
        Ok(tables.votes.get_mut(&id).map(|vote| {
            vote.vote_count = vote_count;
            vote.updated_at = updated_at;
            vote.clone()
        }))
    }

    async fn remove_vote(&self, id: Id) -> Result<bool> {
        Ok(self.tables.write().await.votes.remove(&id).is_some())
    }

    async fn find_vote(&self, id: Id) -> Result<Option<Vote>> {
        Ok(self.tables.read().await.votes.get(&id).cloned())
    }

    async fn find_votes(&self, filter: &VoteFilter) -> Result<Vec<Vote>> {
        let tables = self.tables.read().await;
        Ok(tables
            .votes
            .values()
            .filter(|v| filter.matches(v))
            .cloned()
            .collect())
    }

    async fn vote_totals(&self) -> Result<HashMap<Id, u64>> {
        let tables = self.tables.read().await;
        let mut totals = HashMap::new();
        for vote in tables.votes.values() {
            *totals.entry(vote.candidate_id).or_insert(0) += u64::from(vote.vote_count);
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rocket::tokio;

    use super::*;
    use crate::model::db::{CandidateCore, PositionCore, VoteCore};

    #[rocket::async_test]
    async fn duplicate_vote_rejected_under_concurrency() {
        let store = Arc::new(MemoryStore::new());
        let candidate = store
            .insert_candidate(CandidateCore::example(None))
            .await
            .unwrap();

        // Race many inserts for the same pair; exactly one may win.
        let handles: Vec<_> = (0..16)
            .map(|n| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .insert_vote(VoteCore::example("001", candidate.id, n))
                        .await
                })
            })
            .collect();
        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(Error::Conflict(Conflict::DuplicateVote { mesa, .. })) => {
                    assert_eq!(mesa, "001")
                }
                Err(e) => panic!("unexpected error {e}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(store.find_votes(&VoteFilter::default()).await.unwrap().len(), 1);
    }

    #[rocket::async_test]
    async fn position_names_are_unique() {
        let store = MemoryStore::new();
        let mayor = store.insert_position(PositionCore::example()).await.unwrap();
        let err = store
            .insert_position(PositionCore::example())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Conflict(Conflict::DuplicatePositionName(_))
        ));

        // Renaming onto another position's name is rejected too.
        let mut council = store.insert_position(PositionCore::example2()).await.unwrap();
        council.name = mayor.name.clone();
        assert!(store.replace_position(&council).await.is_err());

        // Replacing a position with its own name is fine.
        assert!(store.replace_position(&mayor).await.unwrap());
    }

    #[rocket::async_test]
    async fn guarded_removal() {
        let store = MemoryStore::new();
        let position = store.insert_position(PositionCore::example()).await.unwrap();
        let candidate = store
            .insert_candidate(CandidateCore::example(Some(position.id)))
            .await
            .unwrap();
        let vote = store
            .insert_vote(VoteCore::example("001", candidate.id, 3))
            .await
            .unwrap();

        assert_eq!(
            store.remove_position(position.id).await.unwrap(),
            Removal::Referenced
        );
        assert_eq!(
            store.remove_candidate(candidate.id).await.unwrap(),
            Removal::Referenced
        );

        assert!(store.remove_vote(vote.id).await.unwrap());
        assert!(!store.remove_vote(vote.id).await.unwrap());
        assert_eq!(
            store.remove_candidate(candidate.id).await.unwrap(),
            Removal::Removed
        );
        assert_eq!(
            store.remove_position(position.id).await.unwrap(),
            Removal::Removed
        );
        assert_eq!(
            store.remove_position(position.id).await.unwrap(),
            Removal::Missing
        );
    }

    #[rocket::async_test]
    async fn writes_recheck_references() {
        let store = MemoryStore::new();
        let position = store.insert_position(PositionCore::example()).await.unwrap();
        let candidate = store
            .insert_candidate(CandidateCore::example(None))
            .await
            .unwrap();

        // The candidate disappears between a caller's lookup and its insert.
        assert!(store.find_candidate(candidate.id).await.unwrap().is_some());
        assert_eq!(
            store.remove_candidate(candidate.id).await.unwrap(),
            Removal::Removed
        );
        let err = store
            .insert_vote(VoteCore::example("001", candidate.id, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(store
            .find_votes(&VoteFilter::default())
            .await
            .unwrap()
            .is_empty());

        // Same for a position removed before a candidate is assigned to it.
        let mut assigned = store
            .insert_candidate(CandidateCore::example2(None))
            .await
            .unwrap();
        assert_eq!(
            store.remove_position(position.id).await.unwrap(),
            Removal::Removed
        );
        let err = store
            .insert_candidate(CandidateCore::example(Some(position.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assigned.candidate.position_id = Some(position.id);
        let err = store.replace_candidate(&assigned).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        let stored = store.find_candidate(assigned.id).await.unwrap().unwrap();
        assert_eq!(stored.position_id, None);
    }

    #[rocket::async_test]
    async fn totals_group_by_candidate() {
        let store = MemoryStore::new();
        let ada = store
            .insert_candidate(CandidateCore::example(None))
            .await
            .unwrap();
        let bruno = store
            .insert_candidate(CandidateCore::example2(None))
            .await
            .unwrap();
        for (mesa, count) in [("001", 10), ("002", 7)] {
            store
                .insert_vote(VoteCore::example(mesa, ada.id, count))
                .await
                .unwrap();
        }
        store
            .insert_vote(VoteCore::example("001", bruno.id, 15))
            .await
            .unwrap();

        let totals = store.vote_totals().await.unwrap();
        assert_eq!(totals[&ada.id], 17);
        assert_eq!(totals[&bruno.id], 15);

        let filter = VoteFilter {
            mesa: Some("001".to_string()),
            candidate_id: Some(bruno.id),
        };
        let votes = store.find_votes(&filter).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].vote_count, 15);
    }
}
