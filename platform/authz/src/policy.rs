use thiserror::Error;
use uuid::Uuid;

use crate::{AppRole, RequestStatus};

/// An action a caller wants to perform, with the state the decision depends on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    ListEmployees,
    CreateEmployee,
    ListAssignments,
    CreateAssignment {
        status: RequestStatus,
    },
    /// Role gate checked before an assignment is looked up, so callers who may
    /// never edit learn nothing about which ids exist.
    EditAssignments,
    /// `current` is the persisted status, `proposed` the status carried by the
    /// patch (if any).
    UpdateAssignment {
        current: RequestStatus,
        proposed: Option<RequestStatus>,
    },
    ListUnavailabilities,
    CreateUnavailability {
        employee_id: Uuid,
        status: RequestStatus,
    },
    ReadCoverageAlerts,
    ReadMedicalAlerts,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ListEmployees => "employees.list",
            Operation::CreateEmployee => "employees.create",
            Operation::ListAssignments => "assignments.list",
            Operation::CreateAssignment { .. } => "assignments.create",
            Operation::EditAssignments => "assignments.edit",
            Operation::UpdateAssignment { .. } => "assignments.update",
            Operation::ListUnavailabilities => "unavailabilities.list",
            Operation::CreateUnavailability { .. } => "unavailabilities.create",
            Operation::ReadCoverageAlerts => "alerts.coverage",
            Operation::ReadMedicalAlerts => "alerts.medical",
        }
    }
}

/// Which rows an allowed caller may see or touch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RowScope {
    All,
    /// Only rows linked to this employee.
    Employee(Uuid),
    /// The caller is allowed to ask but there is nothing they may see.
    Nothing,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Decision {
    Allow(RowScope),
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    pub fn into_result(self) -> Result<RowScope, Denial> {
        match self {
            Decision::Allow(scope) => Ok(scope),
            Decision::Deny(denial) => Err(denial),
        }
    }
}

/// Reason a request was refused. The message is returned to the client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Denial {
    #[error("forbidden for role: {0}")]
    Role(AppRole),
    #[error("CHEF_CHANTIER can only create BROUILLON/SOUMIS assignments")]
    SupervisorCreateStatus,
    #[error("CHEF_CHANTIER cannot edit after validation/refusal")]
    Frozen,
    #[error("CHEF_CHANTIER cannot validate/refuse")]
    SupervisorDecision,
    #[error("CHEF_CHANTIER cannot create unavailabilities")]
    SupervisorUnavailability,
    #[error("SALARIE can only create for self")]
    NotOwnEmployee,
    #[error("SALARIE can only create BROUILLON/SOUMIS")]
    WorkerCreateStatus,
}

/// Decide whether `role`, linked to `employee_id`, may perform `operation`.
pub fn decide(role: AppRole, employee_id: Option<Uuid>, operation: Operation) -> Decision {
    use AppRole::*;
    use Operation::*;

    match (role, operation) {
        (Salarie, ListEmployees | ListAssignments | ListUnavailabilities) => {
            Decision::Allow(own_rows(employee_id))
        }
        (ChefChantier | Responsable, ListEmployees | ListAssignments | ListUnavailabilities) => {
            Decision::Allow(RowScope::All)
        }

        (Responsable, CreateEmployee) => Decision::Allow(RowScope::All),
        (Salarie | ChefChantier, CreateEmployee) => Decision::Deny(Denial::Role(role)),

        (Salarie, CreateAssignment { .. } | EditAssignments | UpdateAssignment { .. }) => {
            Decision::Deny(Denial::Role(role))
        }
        (ChefChantier | Responsable, EditAssignments) => Decision::Allow(RowScope::All),
        (ChefChantier, CreateAssignment { status }) => {
            if status.is_decided() {
                Decision::Deny(Denial::SupervisorCreateStatus)
            } else {
                Decision::Allow(RowScope::All)
            }
        }
        (ChefChantier, UpdateAssignment { current, proposed }) => {
            if current.is_decided() {
                Decision::Deny(Denial::Frozen)
            } else if proposed.is_some_and(RequestStatus::is_decided) {
                Decision::Deny(Denial::SupervisorDecision)
            } else {
                Decision::Allow(RowScope::All)
            }
        }
        (Responsable, CreateAssignment { .. } | UpdateAssignment { .. }) => {
            Decision::Allow(RowScope::All)
        }

        (Salarie, CreateUnavailability { employee_id: target, status }) => {
            if employee_id != Some(target) {
                Decision::Deny(Denial::NotOwnEmployee)
            } else if status.is_decided() {
                Decision::Deny(Denial::WorkerCreateStatus)
            } else {
                Decision::Allow(RowScope::Employee(target))
            }
        }
        (ChefChantier, CreateUnavailability { .. }) => {
            Decision::Deny(Denial::SupervisorUnavailability)
        }
        (Responsable, CreateUnavailability { .. }) => Decision::Allow(RowScope::All),

        (Salarie, ReadCoverageAlerts | ReadMedicalAlerts) => Decision::Deny(Denial::Role(role)),
        (ChefChantier | Responsable, ReadCoverageAlerts | ReadMedicalAlerts) => {
            Decision::Allow(RowScope::All)
        }
    }
}

fn own_rows(employee_id: Option<Uuid>) -> RowScope {
    match employee_id {
        Some(id) => RowScope::Employee(id),
        None => RowScope::Nothing,
    }
}
