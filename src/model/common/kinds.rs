use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// What kind of body a position elects.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionType {
    /// A single office holder, e.g. a mayor.
    #[serde(rename = "AUTHORITY")]
    Authority,
    /// A collegiate body, e.g. a council.
    #[serde(rename = "ORGAN")]
    Organ,
}

impl Display for PositionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Authority => "AUTHORITY",
            Self::Organ => "ORGAN",
        })
    }
}

impl FromStr for PositionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUTHORITY" => Ok(Self::Authority),
            "ORGAN" => Ok(Self::Organ),
            other => Err(Error::validation(format!(
                "invalid position type '{other}', must be AUTHORITY or ORGAN"
            ))),
        }
    }
}

/// How the ballots behind a tally were cast.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteType {
    #[default]
    #[serde(rename = "PERSONAL")]
    Personal,
    #[serde(rename = "PUBLIC")]
    Public,
}

impl Display for VoteType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Personal => "PERSONAL",
            Self::Public => "PUBLIC",
        })
    }
}

impl FromStr for VoteType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERSONAL" => Ok(Self::Personal),
            "PUBLIC" => Ok(Self::Public),
            other => Err(Error::validation(format!(
                "invalid vote type '{other}', must be PERSONAL or PUBLIC"
            ))),
        }
    }
}
