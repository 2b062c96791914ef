use rocket::{
    http::Status,
    outcome::{try_outcome, IntoOutcome},
    request::{FromRequest, Outcome},
    Request,
};

use crate::config::{Config, ReadPolicy};
use crate::error::{Error, Result};

use super::{Claims, Role, AUTH_TOKEN_COOKIE};

/// A verified caller, decoded from a bearer token or the auth cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub email: Option<String>,
    pub role: Role,
}

impl Caller {
    /// Fail with a forbidden error unless this caller may mutate election data.
    pub fn require_mutation_rights(&self) -> Result<()> {
        if self.role.can_mutate_election_data() {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "role {} may not modify election data",
                self.role
            )))
        }
    }
}

/// The raw token, if the request carries one.
fn token_from_request<'r>(req: &'r Request<'_>) -> Option<&'r str> {
    if let Some(header) = req.headers().get_one("Authorization") {
        return header.strip_prefix("Bearer ").map(str::trim);
    }
    req.cookies().get(AUTH_TOKEN_COOKIE).map(|cookie| cookie.value())
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Caller {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = try_outcome!(req.rocket().state::<Config>().into_outcome((
            Status::InternalServerError,
            Error::Internal("config is not managed".to_string()),
        )));

        let token = try_outcome!(token_from_request(req).into_outcome((
            Status::Unauthorized,
            Error::Unauthenticated("missing bearer token".to_string()),
        )));

        match Claims::decode(token, config) {
            Ok(claims) => Outcome::Success(claims.into()),
            Err(e) => {
                debug!("Rejected token: {e}");
                Outcome::Failure((Status::Unauthorized, e))
            }
        }
    }
}

/// Permission to read election data under the configured read policy.
///
/// Holds the caller when one was required.
#[derive(Debug)]
pub struct ReadAccess(pub Option<Caller>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ReadAccess {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let policy = req
            .rocket()
            .state::<Config>()
            .map(Config::read_policy)
            .unwrap_or_default();
        match policy {
            ReadPolicy::Open => Outcome::Success(Self(None)),
            ReadPolicy::Authenticated => Caller::from_request(req).await.map(|c| Self(Some(c))),
        }
    }
}
