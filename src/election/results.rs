use std::collections::HashMap;

use crate::error::Result;
use crate::model::{
    api::{CandidateResult, PositionThreshold, ResultsSummary},
    db::{Candidate, Position},
    mongodb::Id,
    store::{CandidateFilter, ElectionStore},
};

/// Read-only reports over the ledger. Totals come from a single grouped
/// aggregation per call.
pub struct ResultAggregator<'r> {
    store: &'r dyn ElectionStore,
}

service_guard!(ResultAggregator);

/// Pair candidates with their totals, ordered by ballot order then store order.
fn tally(
    mut candidates: Vec<Candidate>,
    totals: &HashMap<Id, u64>,
    positions: &HashMap<Id, Position>,
) -> Vec<CandidateResult> {
    // Stable, so equal orders keep the store's ordering.
    candidates.sort_by_key(|candidate| candidate.order);
    candidates
        .into_iter()
        .map(|candidate| {
            let position = candidate.position_id.and_then(|id| positions.get(&id));
            CandidateResult {
                candidate_id: candidate.id.into(),
                total_votes: totals.get(&candidate.id).copied().unwrap_or(0),
                position_id: candidate.position_id.map(Into::into),
                position_name: position.map(|position| position.name.clone()),
                candidate_name: candidate.candidate.name,
                image_id: candidate.candidate.image_id,
            }
        })
        .collect()
}

impl<'r> ResultAggregator<'r> {
    pub fn new(store: &'r dyn ElectionStore) -> Self {
        Self { store }
    }

    /// Totals for every active candidate. Candidates without tallies count 0.
    pub async fn get_all_results(&self) -> Result<Vec<CandidateResult>> {
        let candidates = self.store.find_candidates(&CandidateFilter::active()).await?;
        let totals = self.store.vote_totals().await?;
        let positions = self
            .store
            .find_positions(false)
            .await?
            .into_iter()
            .map(|position| (position.id, position))
            .collect();
        Ok(tally(candidates, &totals, &positions))
    }

    pub async fn get_results_summary(&self) -> Result<ResultsSummary> {
        let results = self.get_all_results().await?;
        Ok(ResultsSummary {
            total_candidates: results.len(),
            total_votes: results.iter().map(|result| result.total_votes).sum(),
            results,
        })
    }

    /// Totals for the active candidates of one position. An unknown position
    /// has no candidates, so this is empty rather than an error.
    pub async fn get_results_by_position(&self, position_id: Id) -> Result<Vec<CandidateResult>> {
        let filter = CandidateFilter {
            position_id: Some(position_id),
            active_only: true,
        };
        let candidates = self.store.find_candidates(&filter).await?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let totals = self.store.vote_totals().await?;
        let positions = self
            .store
            .find_position(position_id)
            .await?
            .map(|position| (position.id, position))
            .into_iter()
            .collect();
        Ok(tally(candidates, &totals, &positions))
    }

    /// The configured thresholds of every active position, with the
    /// percentage scaled to a whole number. No pass or fail is decided here.
    pub async fn get_results_position(&self) -> Result<Vec<PositionThreshold>> {
        let positions = self.store.find_positions(true).await?;
        Ok(positions
            .into_iter()
            .map(|position| PositionThreshold {
                position_id: position.id.into(),
                total_votes_expected: position.total_votes_expected,
                valid_percentage: (position.valid_percentage * 100.0).round() as u32,
                name: position.position.name,
            })
            .collect())
    }
}
