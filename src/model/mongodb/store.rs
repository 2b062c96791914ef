use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mongodb::{
    bson::{self, doc, Document},
    error::{Error as DbError, ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
    results::InsertOneResult,
    Database,
};
use rocket::futures::TryStreamExt;
use serde::Deserialize;

use crate::error::{Conflict, Error, Result};
use crate::model::{
    db::{Candidate, NewCandidate, NewPosition, NewVote, Position, Vote},
    store::{CandidateFilter, ElectionStore, Removal, VoteFilter},
};

use super::{Coll, Id};

/// MongoDB-backed store. Uniqueness is enforced by the indexes created in
/// [`ensure_indexes_exist`](super::ensure_indexes_exist).
#[derive(Clone)]
pub struct MongoStore {
    positions: Coll<Position>,
    new_positions: Coll<NewPosition>,
    candidates: Coll<Candidate>,
    new_candidates: Coll<NewCandidate>,
    votes: Coll<Vote>,
    new_votes: Coll<NewVote>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            positions: Coll::from_db(db),
            new_positions: Coll::from_db(db),
            candidates: Coll::from_db(db),
            new_candidates: Coll::from_db(db),
            votes: Coll::from_db(db),
            new_votes: Coll::from_db(db),
        }
    }
}

/// The server's code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key_error(err: &DbError) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref e)) if e.code == DUPLICATE_KEY
    )
}

/// Listings come back in insertion order, which `ObjectId`s encode.
fn in_insertion_order() -> FindOptions {
    FindOptions::builder().sort(doc! { "_id": 1 }).build()
}

/// Extract the generated ID from an insertion result.
fn inserted_id(result: InsertOneResult) -> Result<Id> {
    result
        .inserted_id
        .as_object_id()
        .map(Id::from)
        .ok_or_else(|| Error::Internal("inserted document has no ObjectId".to_string()))
}

fn candidate_filter_doc(filter: &CandidateFilter) -> Document {
    let mut query = doc! {};
    if let Some(position_id) = filter.position_id {
        query.insert("position_id", position_id);
    }
    if filter.active_only {
        query.insert("is_active", true);
    }
    query
}

fn vote_filter_doc(filter: &VoteFilter) -> Document {
    let mut query = doc! {};
    if let Some(ref mesa) = filter.mesa {
        query.insert("mesa", mesa.as_str());
    }
    if let Some(candidate_id) = filter.candidate_id {
        query.insert("candidate_id", candidate_id);
    }
    query
}

/// One row of the grouped-sum aggregation.
#[derive(Deserialize)]
struct CandidateTotal {
    #[serde(rename = "_id")]
    candidate_id: Id,
    total: i64,
}

#[rocket::async_trait]
impl ElectionStore for MongoStore {
    async fn insert_position(&self, position: NewPosition) -> Result<Position> {
        match self.new_positions.insert_one(&position, None).await {
            Ok(result) => Ok(Position {
                id: inserted_id(result)?,
                position,
            }),
            Err(e) if is_duplicate_key_error(&e) => Err(Error::Conflict(
                Conflict::DuplicatePositionName(position.name),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn replace_position(&self, position: &Position) -> Result<bool> {
        match self
            .new_positions
            .replace_one(position.id.as_doc(), &position.position, None)
            .await
        {
            Ok(result) => Ok(result.matched_count == 1),
            Err(e) if is_duplicate_key_error(&e) => Err(Error::Conflict(
                Conflict::DuplicatePositionName(position.name.clone()),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_position(&self, id: Id) -> Result<Removal> {
        // Not atomic with the delete; a candidate assigned in between is left dangling.
        let referencing = self
            .candidates
            .count_documents(doc! { "position_id": id }, None)
            .await?;
        if referencing > 0 {
            return Ok(Removal::Referenced);
        }
        let result = self.positions.delete_one(id.as_doc(), None).await?;
        Ok(if result.deleted_count == 1 {
            Removal::Removed
        } else {
            Removal::Missing
        })
    }

    async fn find_position(&self, id: Id) -> Result<Option<Position>> {
        Ok(self.positions.find_one(id.as_doc(), None).await?)
    }

    async fn find_positions(&self, active_only: bool) -> Result<Vec<Position>> {
        let filter = active_only.then(|| doc! { "is_active": true });
        Ok(self
            .positions
            .find(filter, in_insertion_order())
            .await?
            .try_collect()
            .await?)
    }

    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate> {
        // The position reference was checked by the caller, not under a transaction.
        let result = self.new_candidates.insert_one(&candidate, None).await?;
        Ok(Candidate {
            id: inserted_id(result)?,
            candidate,
        })
    }

    async fn replace_candidate(&self, candidate: &Candidate) -> Result<bool> {
        let result = self
            .new_candidates
            .replace_one(candidate.id.as_doc(), &candidate.candidate, None)
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn remove_candidate(&self, id: Id) -> Result<Removal> {
        let tallies = self
            .votes
            .count_documents(doc! { "candidate_id": id }, None)
            .await?;
        if tallies > 0 {
            return Ok(Removal::Referenced);
        }
        let result = self.candidates.delete_one(id.as_doc(), None).await?;
        Ok(if result.deleted_count == 1 {
            Removal::Removed
        } else {
            Removal::Missing
        })
    }

    async fn find_candidate(&self, id: Id) -> Result<Option<Candidate>> {
        Ok(self.candidates.find_one(id.as_doc(), None).await?)
    }

    async fn find_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>> {
        Ok(self
            .candidates
            .find(candidate_filter_doc(filter), in_insertion_order())
            .await?
            .try_collect()
            .await?)
    }

    async fn insert_vote(&self, vote: NewVote) -> Result<Vote> {
        // The unique (mesa, candidate_id) index covers duplicates. The candidate
        // reference was checked by the caller, not under a transaction.
        match self.new_votes.insert_one(&vote, None).await {
            Ok(result) => Ok(Vote {
                id: inserted_id(result)?,
                vote,
            }),
            Err(e) if is_duplicate_key_error(&e) => {
                Err(Error::Conflict(Conflict::DuplicateVote {
                    mesa: vote.mesa,
                    candidate_id: vote.candidate_id,
                }))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_vote_count(
        &self,
        id: Id,
        vote_count: u32,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Vote>> {
        let update = doc! {
            "$set": {
                "vote_count": i64::from(vote_count),
                "updated_at": bson::DateTime::from_chrono(updated_at),
            }
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .votes
            .find_one_and_update(id.as_doc(), update, options)
            .await?)
    }

    async fn remove_vote(&self, id: Id) -> Result<bool> {
        let result = self.votes.delete_one(id.as_doc(), None).await?;
        Ok(result.deleted_count == 1)
    }

    async fn find_vote(&self, id: Id) -> Result<Option<Vote>> {
        Ok(self.votes.find_one(id.as_doc(), None).await?)
    }

    async fn find_votes(&self, filter: &VoteFilter) -> Result<Vec<Vote>> {
        Ok(self
            .votes
            .find(vote_filter_doc(filter), in_insertion_order())
            .await?
            .try_collect()
            .await?)
    }

    async fn vote_totals(&self) -> Result<HashMap<Id, u64>> {
        let pipeline = [doc! {
            "$group": {
                "_id": "$candidate_id",
                "total": { "$sum": "$vote_count" },
            }
        }];
        let rows: Vec<Document> = self
            .votes
            .aggregate(pipeline, None)
            .await?
            .try_collect()
            .await?;
        rows.into_iter()
            .map(|row| {
                let total: CandidateTotal = bson::from_document(row)
                    .map_err(|e| Error::Internal(format!("malformed vote total: {e}")))?;
                let sum = u64::try_from(total.total)
                    .map_err(|_| Error::Internal("negative vote total".to_string()))?;
                Ok((total.candidate_id, sum))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use mongodb::{bson::Bson, error::WriteError};

    use super::*;

    fn write_error(code: i32) -> DbError {
        let error: WriteError = bson::from_document(doc! {
            "code": code,
            "errmsg": "write failed",
        })
        .unwrap();
        DbError::from(ErrorKind::Write(WriteFailure::WriteError(error)))
    }

    #[test]
    fn duplicate_keys_are_recognised() {
        assert!(is_duplicate_key_error(&write_error(DUPLICATE_KEY)));
        // Document validation failure.
        assert!(!is_duplicate_key_error(&write_error(121)));
    }

    #[test]
    fn filters_translate_to_queries() {
        let candidate_id = Id::new();
        let filter = VoteFilter {
            mesa: Some("001".to_string()),
            candidate_id: Some(candidate_id),
        };
        assert_eq!(
            vote_filter_doc(&filter),
            doc! { "mesa": "001", "candidate_id": Bson::from(candidate_id) }
        );
        assert_eq!(vote_filter_doc(&VoteFilter::default()), doc! {});

        let position_id = Id::new();
        let filter = CandidateFilter {
            position_id: Some(position_id),
            active_only: true,
        };
        assert_eq!(
            candidate_filter_doc(&filter),
            doc! { "position_id": Bson::from(position_id), "is_active": true }
        );
    }
}
