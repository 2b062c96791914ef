use chrono::Utc;

use crate::error::{Conflict, Error, Result};
use crate::model::{
    api::{CandidateDescription, CandidatePatch, CandidateSpec, Patch, PositionSummary},
    auth::Caller,
    db::{Candidate, NewCandidate},
    mongodb::Id,
    store::{CandidateFilter, ElectionStore, Removal},
};

use super::{parse_id, position_summaries, position_summary, required_text};

/// What the ledger needs to know about a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRef {
    pub name: String,
    pub position_id: Option<Id>,
}

impl From<Candidate> for CandidateRef {
    fn from(candidate: Candidate) -> Self {
        Self {
            name: candidate.candidate.name,
            position_id: candidate.candidate.position_id,
        }
    }
}

/// Resolves candidates and their position assignments.
pub struct CandidateRegistry<'r> {
    store: &'r dyn ElectionStore,
}

service_guard!(CandidateRegistry);

impl<'r> CandidateRegistry<'r> {
    pub fn new(store: &'r dyn ElectionStore) -> Self {
        Self { store }
    }

    /// Make sure a position reference points at something.
    async fn existing_position(&self, id: Id) -> Result<Id> {
        match self.store.find_position(id).await? {
            Some(_) => Ok(id),
            None => Err(Error::not_found(format!("Position {id}"))),
        }
    }

    async fn describe(&self, candidate: Candidate) -> Result<CandidateDescription> {
        let position = position_summary(self.store, candidate.position_id).await?;
        Ok(CandidateDescription::new(candidate, position))
    }

    pub async fn create(
        &self,
        caller: &Caller,
        spec: CandidateSpec,
    ) -> Result<CandidateDescription> {
        caller.require_mutation_rights()?;
        let name = required_text(&spec.name, "name")?;
        let position_id = match spec.position_id {
            Some(ref raw) => Some(self.existing_position(parse_id(raw, "Position")?).await?),
            None => None,
        };

        let now = Utc::now();
        let candidate = self
            .store
            .insert_candidate(NewCandidate {
                name,
                description: spec.description,
                image_id: spec.image_id,
                order: spec.order.unwrap_or(0),
                is_active: spec.is_active.unwrap_or(true),
                position_id,
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(
            "{} created candidate {} ({})",
            caller.id, candidate.id, candidate.name
        );
        self.describe(candidate).await
    }

    pub async fn update(
        &self,
        caller: &Caller,
        id: Id,
        patch: CandidatePatch,
    ) -> Result<CandidateDescription> {
        caller.require_mutation_rights()?;
        let name = patch
            .name
            .as_deref()
            .map(|name| required_text(name, "name"))
            .transpose()?;

        let mut candidate = self
            .store
            .find_candidate(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Candidate {id}")))?;

        // Resolve the new position before touching anything.
        let position_id = patch
            .position_id
            .try_map(|raw| parse_id(&raw, "Position"))?;
        if let Patch::Set(position_id) = position_id {
            self.existing_position(position_id).await?;
        }

        if let Some(name) = name {
            candidate.name = name;
        }
        patch.description.apply(&mut candidate.description);
        patch.image_id.apply(&mut candidate.image_id);
        if let Some(order) = patch.order {
            candidate.order = order;
        }
        if let Some(is_active) = patch.is_active {
            candidate.is_active = is_active;
        }
        position_id.apply(&mut candidate.position_id);
        candidate.updated_at = Utc::now();

        if !self.store.replace_candidate(&candidate).await? {
            return Err(Error::not_found(format!("Candidate {id}")));
        }
        info!("{} updated candidate {id}", caller.id);
        self.describe(candidate).await
    }

    /// Remove a candidate. Refused while tallies are recorded for it.
    pub async fn delete(&self, caller: &Caller, id: Id) -> Result<()> {
        caller.require_mutation_rights()?;
        match self.store.remove_candidate(id).await? {
            Removal::Removed => {
                info!("{} deleted candidate {id}", caller.id);
                Ok(())
            }
            Removal::Missing => Err(Error::not_found(format!("Candidate {id}"))),
            Removal::Referenced => Err(Error::Conflict(Conflict::CandidateHasVotes(id))),
        }
    }

    pub async fn get_all(&self) -> Result<Vec<CandidateDescription>> {
        let positions = position_summaries(self.store).await?;
        let candidates = self.store.find_candidates(&CandidateFilter::default()).await?;
        Ok(candidates
            .into_iter()
            .map(|candidate| {
                let position = candidate
                    .position_id
                    .and_then(|id| positions.get(&id).cloned());
                CandidateDescription::new(candidate, position)
            })
            .collect())
    }

    pub async fn get_one(&self, id: Id) -> Result<CandidateDescription> {
        let candidate = self
            .store
            .find_candidate(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Candidate {id}")))?;
        self.describe(candidate).await
    }

    /// The position a candidate stands for, if any.
    pub async fn get_position(&self, id: Id) -> Result<Option<PositionSummary>> {
        let candidate = self
            .store
            .find_candidate(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Candidate {id}")))?;
        position_summary(self.store, candidate.position_id).await
    }

    /// Resolve a candidate reference, or `None` if there is no such candidate.
    pub async fn lookup(&self, id: Id) -> Result<Option<CandidateRef>> {
        Ok(self.store.find_candidate(id).await?.map(Into::into))
    }
}
