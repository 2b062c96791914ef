use std::collections::HashMap;

use chrono::Utc;

use crate::error::{Error, Result};
use crate::model::{
    api::{VoteDescription, VotePatch, VoteSpec},
    auth::Caller,
    common::VoteType,
    db::{NewVote, Vote},
    mongodb::Id,
    store::{CandidateFilter, ElectionStore, VoteFilter},
};

use super::{parse_id, position_summaries, position_summary, required_text, CandidateRegistry};

/// Records and corrects per-mesa tallies.
///
/// There is at most one tally per (mesa, candidate) pair. The store enforces
/// this on insert, so two concurrent recordings of the same pair cannot both
/// succeed.
pub struct VoteLedger<'r> {
    store: &'r dyn ElectionStore,
}

service_guard!(VoteLedger);

fn check_vote_count(count: i64) -> Result<u32> {
    if count < 0 {
        return Err(Error::validation("vote count cannot be negative"));
    }
    u32::try_from(count).map_err(|_| Error::validation("vote count is too large"))
}

impl<'r> VoteLedger<'r> {
    pub fn new(store: &'r dyn ElectionStore) -> Self {
        Self { store }
    }

    /// Attach the candidate's name and position to a single tally.
    async fn describe(&self, vote: Vote) -> Result<VoteDescription> {
        let candidate = CandidateRegistry::new(self.store)
            .lookup(vote.candidate_id)
            .await?;
        let (name, position) = match candidate {
            Some(candidate) => (
                Some(candidate.name),
                position_summary(self.store, candidate.position_id).await?,
            ),
            None => (None, None),
        };
        Ok(VoteDescription::new(vote, name, position))
    }

    /// Attach candidate names and positions to many tallies with one read of each table.
    async fn describe_all(&self, votes: Vec<Vote>) -> Result<Vec<VoteDescription>> {
        let positions = position_summaries(self.store).await?;
        let candidates: HashMap<_, _> = self
            .store
            .find_candidates(&CandidateFilter::default())
            .await?
            .into_iter()
            .map(|candidate| (candidate.id, candidate))
            .collect();
        Ok(votes
            .into_iter()
            .map(|vote| match candidates.get(&vote.candidate_id) {
                Some(candidate) => {
                    let position = candidate
                        .position_id
                        .and_then(|id| positions.get(&id).cloned());
                    VoteDescription::new(vote, Some(candidate.name.clone()), position)
                }
                None => VoteDescription::new(vote, None, None),
            })
            .collect())
    }

    /// Record the tally of one candidate at one mesa.
    ///
    /// Checks run in a fixed order and the first failure is reported: caller
    /// rights, mesa, vote count, vote type, candidate existence, and finally
    /// uniqueness of the (mesa, candidate) pair.
    pub async fn create(&self, caller: &Caller, spec: VoteSpec) -> Result<VoteDescription> {
        caller.require_mutation_rights()?;
        let mesa = required_text(&spec.mesa, "mesa")?;
        let vote_count = check_vote_count(spec.vote_count)?;
        let vote_type = match spec.vote_type {
            Some(ref raw) => raw.trim().parse::<VoteType>()?,
            None => VoteType::default(),
        };
        let candidate_id = parse_id(&spec.candidate_id, "Candidate")?;
        let candidate = CandidateRegistry::new(self.store)
            .lookup(candidate_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;

        let now = Utc::now();
        let vote = self
            .store
            .insert_vote(NewVote {
                mesa,
                candidate_id,
                vote_count,
                vote_type,
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(
            "{} recorded {} votes for candidate {candidate_id} at mesa {}",
            caller.id, vote.vote_count, vote.mesa
        );

        let position = position_summary(self.store, candidate.position_id).await?;
        Ok(VoteDescription::new(vote, Some(candidate.name), position))
    }

    /// Correct the count of an existing tally. Without a new count this just
    /// returns the tally as stored.
    pub async fn update(&self, caller: &Caller, id: Id, patch: VotePatch) -> Result<VoteDescription> {
        caller.require_mutation_rights()?;
        let vote = match patch.vote_count {
            Some(count) => {
                let count = check_vote_count(count)?;
                let vote = self.store.set_vote_count(id, count, Utc::now()).await?;
                if vote.is_some() {
                    info!("{} set tally {id} to {count}", caller.id);
                }
                vote
            }
            None => self.store.find_vote(id).await?,
        };
        let vote = vote.ok_or_else(|| Error::not_found(format!("Vote {id}")))?;
        self.describe(vote).await
    }

    pub async fn delete(&self, caller: &Caller, id: Id) -> Result<()> {
        caller.require_mutation_rights()?;
        if self.store.remove_vote(id).await? {
            info!("{} deleted tally {id}", caller.id);
            Ok(())
        } else {
            Err(Error::not_found(format!("Vote {id}")))
        }
    }

    /// All tallies passing the filter. Both criteria apply when both are set.
    pub async fn get_all(&self, filter: &VoteFilter) -> Result<Vec<VoteDescription>> {
        debug!("Listing tallies with {filter:?}");
        let votes = self.store.find_votes(filter).await?;
        self.describe_all(votes).await
    }

    pub async fn get_one(&self, id: Id) -> Result<VoteDescription> {
        let vote = self
            .store
            .find_vote(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Vote {id}")))?;
        self.describe(vote).await
    }

    pub async fn get_by_mesa(&self, mesa: &str) -> Result<Vec<VoteDescription>> {
        let filter = VoteFilter {
            mesa: Some(mesa.trim().to_string()),
            candidate_id: None,
        };
        self.get_all(&filter).await
    }

    pub async fn get_by_candidate(&self, candidate_id: Id) -> Result<Vec<VoteDescription>> {
        let filter = VoteFilter {
            mesa: None,
            candidate_id: Some(candidate_id),
        };
        self.get_all(&filter).await
    }
}
