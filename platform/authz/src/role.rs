use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authorization roles, in increasing order of privilege.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppRole {
    /// Worker; sees and requests things for their own employee record only.
    Salarie,
    /// Site supervisor; drafts and submits the schedule.
    ChefChantier,
    /// Manager; unrestricted.
    Responsable,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl AppRole {
    pub fn as_str(self) -> &'static str {
        match self {
            AppRole::Salarie => "SALARIE",
            AppRole::ChefChantier => "CHEF_CHANTIER",
            AppRole::Responsable => "RESPONSABLE",
        }
    }
}

impl FromStr for AppRole {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "SALARIE" => Ok(AppRole::Salarie),
            "CHEF_CHANTIER" => Ok(AppRole::ChefChantier),
            "RESPONSABLE" => Ok(AppRole::Responsable),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for AppRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
