use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{common::PositionType, db::Position};

use super::{ApiId, Patch};

/// A position as submitted by an administrator.
///
/// Enumerations and numbers are kept loose here so that bad values surface as
/// validation errors from the registry rather than as body parse failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub total_votes_expected: i64,
    pub valid_percentage: f64,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// A partial update to a position. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub total_votes_expected: Option<i64>,
    #[serde(default)]
    pub valid_percentage: Option<f64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// API-friendly view of a stored position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDescription {
    pub id: ApiId,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: PositionType,
    pub total_votes_expected: u32,
    pub valid_percentage: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Position> for PositionDescription {
    fn from(position: Position) -> Self {
        Self {
            id: position.id.into(),
            name: position.position.name,
            description: position.position.description,
            kind: position.position.kind,
            total_votes_expected: position.position.total_votes_expected,
            valid_percentage: position.position.valid_percentage,
            is_active: position.position.is_active,
            created_at: position.position.created_at,
            updated_at: position.position.updated_at,
        }
    }
}

/// Just enough of a position to label something that refers to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSummary {
    pub id: ApiId,
    pub name: String,
}

impl From<&Position> for PositionSummary {
    fn from(position: &Position) -> Self {
        Self {
            id: position.id.into(),
            name: position.name.clone(),
        }
    }
}
