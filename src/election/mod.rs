//! The election services: registries for positions and candidates, the vote
//! ledger, and the results aggregator.
//!
//! Each service borrows the managed [`Store`] and can be taken directly as a
//! request guard.

use std::collections::HashMap;

use rocket::{
    http::Status,
    outcome::IntoOutcome,
    request::Outcome,
    Request,
};

use crate::error::{Error, Result};
use crate::model::{api::PositionSummary, mongodb::Id, ElectionStore, Store};

/// Borrow the managed store for the lifetime of the request.
fn managed_store<'r>(req: &'r Request<'_>) -> Outcome<&'r dyn ElectionStore, Error> {
    req.rocket()
        .state::<Store>()
        .map(|store| &**store)
        .into_outcome((
            Status::InternalServerError,
            Error::Internal("store is not managed".to_string()),
        ))
}

/// Implement `FromRequest` for a service holding only a store reference.
macro_rules! service_guard {
    ($service:ident) => {
        #[rocket::async_trait]
        impl<'r> rocket::request::FromRequest<'r> for $service<'r> {
            type Error = crate::error::Error;

            async fn from_request(
                req: &'r rocket::Request<'_>,
            ) -> rocket::request::Outcome<Self, Self::Error> {
                crate::election::managed_store(req).map(Self::new)
            }
        }
    };
}

mod candidates;
mod ledger;
mod positions;
mod results;

pub use candidates::{CandidateRef, CandidateRegistry};
pub use ledger::VoteLedger;
pub use positions::PositionRegistry;
pub use results::ResultAggregator;

/// Parse an ID given by a client. Unparseable IDs cannot name anything, so
/// they are reported as missing.
fn parse_id(raw: &str, what: &str) -> Result<Id> {
    raw.trim()
        .parse()
        .map_err(|_| Error::not_found(format!("{what} {raw}")))
}

/// Trim a required text field, rejecting blank values.
fn required_text(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        Err(Error::validation(format!("{field} cannot be empty")))
    } else {
        Ok(value.to_string())
    }
}

/// Summaries of every position, keyed by ID, for hydrating lists.
async fn position_summaries(store: &dyn ElectionStore) -> Result<HashMap<Id, PositionSummary>> {
    Ok(store
        .find_positions(false)
        .await?
        .iter()
        .map(|position| (position.id, PositionSummary::from(position)))
        .collect())
}

/// Summary of a single position, if it is set and still exists.
async fn position_summary(
    store: &dyn ElectionStore,
    position_id: Option<Id>,
) -> Result<Option<PositionSummary>> {
    match position_id {
        Some(id) => Ok(store
            .find_position(id)
            .await?
            .as_ref()
            .map(PositionSummary::from)),
        None => Ok(None),
    }
}
