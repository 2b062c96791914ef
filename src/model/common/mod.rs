mod kinds;

pub use kinds::{PositionType, VoteType};
