//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in a DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.
//! - Entities refer to each other by ID only; nothing embeds another entity.

mod candidate;
pub use candidate::{Candidate, CandidateCore, NewCandidate};

mod position;
pub use position::{NewPosition, Position, PositionCore};

mod vote;
pub use vote::{NewVote, Vote, VoteCore};
