use chrono::Utc;

use crate::error::{Conflict, Error, Result};
use crate::model::{
    api::{PositionDescription, PositionPatch, PositionSpec},
    auth::Caller,
    common::PositionType,
    db::NewPosition,
    mongodb::Id,
    store::{ElectionStore, Removal},
};

use super::required_text;

/// Stores positions and their validity parameters.
pub struct PositionRegistry<'r> {
    store: &'r dyn ElectionStore,
}

service_guard!(PositionRegistry);

fn parse_kind(kind: &str) -> Result<PositionType> {
    kind.trim().parse()
}

fn check_votes_expected(total: i64) -> Result<u32> {
    if total <= 0 {
        return Err(Error::validation("totalVotesExpected must be greater than 0"));
    }
    u32::try_from(total).map_err(|_| Error::validation("totalVotesExpected is too large"))
}

fn check_valid_percentage(fraction: f64) -> Result<f64> {
    // NaN fails the range check too.
    if (0.0..=1.0).contains(&fraction) {
        Ok(fraction)
    } else {
        Err(Error::validation("validPercentage must be between 0 and 1"))
    }
}

impl<'r> PositionRegistry<'r> {
    pub fn new(store: &'r dyn ElectionStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, caller: &Caller, spec: PositionSpec) -> Result<PositionDescription> {
        caller.require_mutation_rights()?;
        let name = required_text(&spec.name, "name")?;
        let kind = parse_kind(&spec.kind)?;
        let total_votes_expected = check_votes_expected(spec.total_votes_expected)?;
        let valid_percentage = check_valid_percentage(spec.valid_percentage)?;

        let now = Utc::now();
        let position = self
            .store
            .insert_position(NewPosition {
                name,
                description: spec.description,
                kind,
                total_votes_expected,
                valid_percentage,
                is_active: spec.is_active.unwrap_or(true),
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(
            "{} created position {} ({})",
            caller.id, position.id, position.name
        );
        Ok(position.into())
    }

    pub async fn update(
        &self,
        caller: &Caller,
        id: Id,
        patch: PositionPatch,
    ) -> Result<PositionDescription> {
        caller.require_mutation_rights()?;
        let name = patch
            .name
            .as_deref()
            .map(|name| required_text(name, "name"))
            .transpose()?;
        let kind = patch.kind.as_deref().map(parse_kind).transpose()?;
        let total_votes_expected = patch
            .total_votes_expected
            .map(check_votes_expected)
            .transpose()?;
        let valid_percentage = patch
            .valid_percentage
            .map(check_valid_percentage)
            .transpose()?;

        let mut position = self
            .store
            .find_position(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Position {id}")))?;
        if let Some(name) = name {
            position.name = name;
        }
        patch.description.apply(&mut position.description);
        if let Some(kind) = kind {
            position.kind = kind;
        }
        if let Some(total) = total_votes_expected {
            position.total_votes_expected = total;
        }
        if let Some(fraction) = valid_percentage {
            position.valid_percentage = fraction;
        }
        if let Some(is_active) = patch.is_active {
            position.is_active = is_active;
        }
        position.updated_at = Utc::now();

        if !self.store.replace_position(&position).await? {
            return Err(Error::not_found(format!("Position {id}")));
        }
        info!("{} updated position {id}", caller.id);
        Ok(position.into())
    }

    /// Remove a position. Refused while any candidate is assigned to it.
    pub async fn delete(&self, caller: &Caller, id: Id) -> Result<()> {
        caller.require_mutation_rights()?;
        match self.store.remove_position(id).await? {
            Removal::Removed => {
                info!("{} deleted position {id}", caller.id);
                Ok(())
            }
            Removal::Missing => Err(Error::not_found(format!("Position {id}"))),
            Removal::Referenced => Err(Error::Conflict(Conflict::PositionInUse(id))),
        }
    }

    pub async fn get_all(&self) -> Result<Vec<PositionDescription>> {
        let positions = self.store.find_positions(false).await?;
        Ok(positions.into_iter().map(Into::into).collect())
    }

    pub async fn get_one(&self, id: Id) -> Result<PositionDescription> {
        self.store
            .find_position(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| Error::not_found(format!("Position {id}")))
    }
}
