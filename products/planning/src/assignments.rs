use chrono::NaiveDate;
use entity::{assignments, employees};
use platform_api::{ApiError, ApiResult};
use platform_authn::UserProfile;
use platform_authz::{AppRole, Denial, Operation, RequestStatus, RowScope};
use platform_db::DbPool;
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
    sea_query::{Expr, Query, SimpleExpr, UpdateStatement},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    Created, Updated,
    support::{
        ACTIVITY_TYPE, REQUEST_STATUS, ROLE_CODE, SHIFT_CODE, authorize, db_error, enum_value,
        execute, required, text, write_failed,
    },
};

/// An assignment joined with its employee's name.
#[derive(Clone, Debug, Serialize, FromQueryResult, PartialEq, Eq)]
pub struct AssignmentView {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub activity: String,
    pub assign_date: NaiveDate,
    pub role: String,
    pub shift: String,
    pub is_pf: bool,
    pub status: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AssignmentFilter {
    pub activity: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewAssignment {
    pub employee_id: Option<Uuid>,
    pub activity: Option<String>,
    pub assign_date: Option<NaiveDate>,
    pub role: Option<String>,
    pub shift: Option<String>,
    pub is_pf: Option<bool>,
    pub status: Option<RequestStatus>,
}

/// Partial update. Fields outside this set are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AssignmentPatch {
    pub activity: Option<String>,
    pub assign_date: Option<NaiveDate>,
    pub role: Option<String>,
    pub shift: Option<String>,
    pub is_pf: Option<bool>,
    pub status: Option<RequestStatus>,
}

impl AssignmentPatch {
    fn set_values(&self) -> Vec<(assignments::Column, SimpleExpr)> {
        let mut values = Vec::new();
        if let Some(activity) = &self.activity {
            values.push((
                assignments::Column::Activity,
                enum_value(activity.as_str(), ACTIVITY_TYPE),
            ));
        }
        if let Some(date) = self.assign_date {
            values.push((assignments::Column::AssignDate, date.into()));
        }
        if let Some(role) = &self.role {
            values.push((assignments::Column::Role, enum_value(role.as_str(), ROLE_CODE)));
        }
        if let Some(shift) = &self.shift {
            values.push((assignments::Column::Shift, enum_value(shift.as_str(), SHIFT_CODE)));
        }
        if let Some(is_pf) = self.is_pf {
            values.push((assignments::Column::IsPf, is_pf.into()));
        }
        if let Some(status) = self.status {
            values.push((
                assignments::Column::Status,
                enum_value(status.as_str(), REQUEST_STATUS),
            ));
        }
        values
    }
}

#[derive(FromQueryResult)]
struct StatusRow {
    status: String,
}

#[instrument(name = "planning.assignments.list", skip_all, fields(role = %caller.role))]
pub async fn list(
    db: &DbPool,
    caller: &UserProfile,
    filter: AssignmentFilter,
) -> ApiResult<Vec<AssignmentView>> {
    let scope = authorize(caller, Operation::ListAssignments)?;

    let mut query = assignments::Entity::find()
        .select_only()
        .column(assignments::Column::Id)
        .column(assignments::Column::EmployeeId)
        .column(employees::Column::FirstName)
        .column(employees::Column::LastName)
        .column_as(text((assignments::Entity, assignments::Column::Activity)), "activity")
        .column(assignments::Column::AssignDate)
        .column_as(text((assignments::Entity, assignments::Column::Role)), "role")
        .column_as(text((assignments::Entity, assignments::Column::Shift)), "shift")
        .column(assignments::Column::IsPf)
        .column_as(text((assignments::Entity, assignments::Column::Status)), "status")
        .join(JoinType::InnerJoin, assignments::Relation::Employee.def());

    match scope {
        RowScope::Nothing => return Ok(Vec::new()),
        RowScope::Employee(id) => query = query.filter(assignments::Column::EmployeeId.eq(id)),
        RowScope::All => {}
    }
    if let Some(activity) = filter.activity.filter(|a| !a.is_empty()) {
        query = query.filter(
            Expr::expr(text((assignments::Entity, assignments::Column::Activity))).eq(activity),
        );
    }
    if let Some(from) = filter.date_from {
        query = query.filter(assignments::Column::AssignDate.gte(from));
    }
    if let Some(to) = filter.date_to {
        query = query.filter(assignments::Column::AssignDate.lte(to));
    }

    query
        .order_by_asc(assignments::Column::AssignDate)
        .order_by_asc(assignments::Column::Activity)
        .order_by_asc(assignments::Column::Role)
        .order_by_asc(assignments::Column::Shift)
        .into_model::<AssignmentView>()
        .all(db)
        .await
        .map_err(db_error)
}

#[instrument(name = "planning.assignments.create", skip_all, fields(role = %caller.role))]
pub async fn create(
    db: &DbPool,
    caller: &UserProfile,
    input: NewAssignment,
) -> ApiResult<Created> {
    let employee_id = required(input.employee_id, "employee_id")?;
    let activity = required(input.activity, "activity")?;
    let assign_date = required(input.assign_date, "assign_date")?;
    let role = required(input.role, "role")?;
    let shift = required(input.shift, "shift")?;
    let status = required(input.status, "status")?;
    authorize(caller, Operation::CreateAssignment { status })?;

    let id = Uuid::new_v4();
    let statement = Query::insert()
        .into_table(assignments::Entity)
        .columns([
            assignments::Column::Id,
            assignments::Column::EmployeeId,
            assignments::Column::Activity,
            assignments::Column::AssignDate,
            assignments::Column::Role,
            assignments::Column::Shift,
            assignments::Column::IsPf,
            assignments::Column::Status,
            assignments::Column::CreatedBy,
        ])
        .values([
            id.into(),
            employee_id.into(),
            enum_value(activity, ACTIVITY_TYPE),
            assign_date.into(),
            enum_value(role, ROLE_CODE),
            enum_value(shift, SHIFT_CODE),
            input.is_pf.unwrap_or(false).into(),
            enum_value(status.as_str(), REQUEST_STATUS),
            caller.user_id.into(),
        ])
        .map_err(|err| ApiError::internal(anyhow::anyhow!("{err:?}")))?
        .to_owned();
    execute(db, &statement)
        .await
        .map_err(|err| write_failed("Insert", err))?;

    info!(assignment_id = %id, %employee_id, %status, "assignment created");
    Ok(Created { id })
}

/// Apply a patch. Supervisor writes are conditional on the stored status
/// still being pre-decision, so a concurrent validation wins.
#[instrument(
    name = "planning.assignments.update",
    skip_all,
    fields(role = %caller.role, assignment_id = %assignment_id)
)]
pub async fn update(
    db: &DbPool,
    caller: &UserProfile,
    assignment_id: Uuid,
    patch: AssignmentPatch,
) -> ApiResult<Updated> {
    authorize(caller, Operation::EditAssignments)?;
    let current = stored_status(db, assignment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Assignment not found"))?;

    authorize(
        caller,
        Operation::UpdateAssignment {
            current,
            proposed: patch.status,
        },
    )?;

    let values = patch.set_values();
    if values.is_empty() {
        return Ok(Updated::rows(0));
    }

    let guarded = caller.role == AppRole::ChefChantier;
    let updated = apply_update(db, assignment_id, values, guarded).await?;
    info!(updated, "assignment updated");
    Ok(Updated::rows(updated))
}

async fn stored_status(db: &DbPool, assignment_id: Uuid) -> ApiResult<Option<RequestStatus>> {
    let row = assignments::Entity::find_by_id(assignment_id)
        .select_only()
        .column_as(text((assignments::Entity, assignments::Column::Status)), "status")
        .into_model::<StatusRow>()
        .one(db)
        .await
        .map_err(db_error)?;
    row.map(|row| {
        row.status
            .parse::<RequestStatus>()
            .map_err(|err| ApiError::internal(anyhow::Error::new(err)))
    })
    .transpose()
}

/// `guarded` adds `status IN (BROUILLON, SOUMIS)` to the row match.
fn update_statement(
    assignment_id: Uuid,
    values: Vec<(assignments::Column, SimpleExpr)>,
    guarded: bool,
) -> UpdateStatement {
    let mut statement = Query::update();
    statement
        .table(assignments::Entity)
        .values(values)
        .and_where(Expr::col(assignments::Column::Id).eq(assignment_id));
    if guarded {
        statement.and_where(
            Expr::expr(text(assignments::Column::Status))
                .is_in(RequestStatus::PRE_DECISION.map(RequestStatus::as_str)),
        );
    }
    statement
}

/// A guarded write matching nothing is re-read once: a vanished row is
/// `NotFound`, anything else was decided after the first read.
async fn apply_update(
    db: &DbPool,
    assignment_id: Uuid,
    values: Vec<(assignments::Column, SimpleExpr)>,
    guarded: bool,
) -> ApiResult<u64> {
    let statement = update_statement(assignment_id, values, guarded);
    let updated = execute(db, &statement)
        .await
        .map_err(|err| write_failed("Update", err))?;
    if updated > 0 || !guarded {
        return Ok(updated);
    }
    match stored_status(db, assignment_id).await? {
        None => {
            warn!("assignment removed before the update landed");
            Err(ApiError::not_found("Assignment not found"))
        }
        Some(status) => {
            warn!(%status, "assignment was decided before the update landed");
            Err(Denial::Frozen.into())
        }
    }
}
