use std::fmt::{Display, Formatter};

use jsonwebtoken::errors::Error as JwtError;
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, status, Responder},
    serde::json::Json,
    Request,
};
use serde::Serialize;
use thiserror::Error;

use crate::model::mongodb::Id;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(Conflict),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The ways a mutation can collide with existing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// A tally already exists for this mesa and candidate.
    DuplicateVote { mesa: String, candidate_id: Id },
    /// Another position already uses this name.
    DuplicatePositionName(String),
    /// The candidate still has recorded tallies.
    CandidateHasVotes(Id),
    /// The position is still referenced by at least one candidate.
    PositionInUse(Id),
}

impl Display for Conflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateVote { mesa, candidate_id } => write!(
                f,
                "DuplicateVote: mesa '{mesa}' already has a tally for candidate {candidate_id}"
            ),
            Self::DuplicatePositionName(name) => {
                write!(f, "DuplicatePositionName: position '{name}' already exists")
            }
            Self::CandidateHasVotes(id) => {
                write!(f, "CandidateHasVotes: candidate {id} still has recorded votes")
            }
            Self::PositionInUse(id) => {
                write!(f, "PositionInUse: position {id} is still assigned to candidates")
            }
        }
    }
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// The taxonomy name reported in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::NotFound(_) => "NotFoundError",
            Self::Unauthenticated(_) | Self::Forbidden(_) | Self::Jwt(_) => "AuthorizationError",
            Self::Conflict(_) => "ConflictError",
            Self::Db(_) | Self::Internal(_) => "InternalError",
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Validation(_) => Status::BadRequest,
            Self::NotFound(_) => Status::NotFound,
            Self::Unauthenticated(_) | Self::Jwt(_) => Status::Unauthorized,
            Self::Forbidden(_) => Status::Forbidden,
            Self::Conflict(_) => Status::Conflict,
            Self::Db(_) | Self::Internal(_) => Status::InternalServerError,
        }
    }
}

/// JSON body sent back for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl ErrorBody {
    pub fn new(error: &'static str, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
        }
    }
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        let message = match err {
            // Never leak driver or token internals.
            Error::Db(_) | Error::Internal(_) => "Internal server error".to_string(),
            Error::Jwt(_) => "Invalid or expired token".to_string(),
            other => other.to_string(),
        };
        Self::new(err.kind(), message)
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!("{self}");
        } else {
            debug!("{self}");
        }
        status::Custom(status, Json(ErrorBody::from(&self))).respond_to(req)
    }
}
