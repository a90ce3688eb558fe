use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Approval workflow shared by assignments and unavailabilities:
/// BROUILLON -> SOUMIS -> {VALIDE, REFUSE}.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Brouillon,
    Soumis,
    Valide,
    Refuse,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown request status: {0}")]
pub struct UnknownStatus(pub String);

impl RequestStatus {
    /// States a supervisor may still write.
    pub const PRE_DECISION: [RequestStatus; 2] = [RequestStatus::Brouillon, RequestStatus::Soumis];

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Brouillon => "BROUILLON",
            RequestStatus::Soumis => "SOUMIS",
            RequestStatus::Valide => "VALIDE",
            RequestStatus::Refuse => "REFUSE",
        }
    }

    /// VALIDE and REFUSE freeze the row for everyone but RESPONSABLE.
    pub fn is_decided(self) -> bool {
        matches!(self, RequestStatus::Valide | RequestStatus::Refuse)
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "BROUILLON" => Ok(RequestStatus::Brouillon),
            "SOUMIS" => Ok(RequestStatus::Soumis),
            "VALIDE" => Ok(RequestStatus::Valide),
            "REFUSE" => Ok(RequestStatus::Refuse),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
