use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core candidate data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub name: String,
    pub description: Option<String>,
    /// Opaque reference into the external image store. Never dereferenced here.
    pub image_id: Option<String>,
    /// Ballot ordering; lower comes first.
    pub order: i32,
    pub is_active: bool,
    pub position_id: Option<Id>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// A candidate without an ID.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl CandidateCore {
        pub fn example(position_id: Option<Id>) -> Self {
            let now = Utc::now();
            Self {
                name: "Ada Quispe".to_string(),
                description: None,
                image_id: Some("img-ada".to_string()),
                order: 1,
                is_active: true,
                position_id,
                created_at: now,
                updated_at: now,
            }
        }

        pub fn example2(position_id: Option<Id>) -> Self {
            Self {
                name: "Bruno Mamani".to_string(),
                image_id: None,
                order: 2,
                ..Self::example(position_id)
            }
        }
    }
}
