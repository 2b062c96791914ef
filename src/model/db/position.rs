use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{common::PositionType, mongodb::Id};

/// Core position data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionCore {
    /// Unique display name.
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: PositionType,
    /// Number of votes the position expects across all mesas.
    pub total_votes_expected: u32,
    /// Fraction of `total_votes_expected` a tally must reach to be valid.
    pub valid_percentage: f64,
    pub is_active: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// A position without an ID.
pub type NewPosition = PositionCore;

/// A position from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub position: PositionCore,
}

impl Deref for Position {
    type Target = PositionCore;

    fn deref(&self) -> &Self::Target {
        &self.position
    }
}

impl DerefMut for Position {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.position
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl PositionCore {
        pub fn example() -> Self {
            let now = Utc::now();
            Self {
                name: "Mayor".to_string(),
                description: Some("Head of the municipal government".to_string()),
                kind: PositionType::Authority,
                total_votes_expected: 100,
                valid_percentage: 0.5,
                is_active: true,
                created_at: now,
                updated_at: now,
            }
        }

        pub fn example2() -> Self {
            Self {
                name: "Council".to_string(),
                description: None,
                kind: PositionType::Organ,
                total_votes_expected: 250,
                valid_percentage: 0.333,
                ..Self::example()
            }
        }
    }
}
