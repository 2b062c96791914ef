use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Different privilege levels.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "POLLING_STATION_CHIEF")]
    PollingStationChief,
    /// Front desk staff.
    #[serde(rename = "MESADEPARTES")]
    MesaDePartes,
}

impl Role {
    /// May this role create, update or delete positions, candidates and tallies?
    pub fn can_mutate_election_data(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Admin => "ADMIN",
                Self::PollingStationChief => "POLLING_STATION_CHIEF",
                Self::MesaDePartes => "MESADEPARTES",
            }
        )
    }
}
