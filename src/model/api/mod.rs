//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Datetimes are serialised as RFC 3339 strings.
//! - Field names are camelCase.

mod candidate;
mod envelope;
mod id;
mod patch;
mod position;
mod results;
mod vote;

pub use candidate::{CandidateDescription, CandidatePatch, CandidateSpec};
pub use envelope::Envelope;
pub use id::ApiId;
pub use patch::Patch;
pub use position::{PositionDescription, PositionPatch, PositionSpec, PositionSummary};
pub use results::{CandidateResult, PositionThreshold, ResultsSummary};
pub use vote::{VoteDescription, VotePatch, VoteSpec};
