use chrono::{NaiveDate, NaiveTime};
use entity::{employees, unavailabilities};
use platform_api::{ApiError, ApiResult};
use platform_authn::UserProfile;
use platform_authz::{Operation, RequestStatus, RowScope};
use platform_db::DbPool;
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, sea_query::Query,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    Created,
    support::{
        AVAILABILITY_IMPACT, REQUEST_STATUS, UNAVAILABILITY_TYPE, authorize, db_error, enum_value,
        execute, required, text, write_failed,
    },
};

#[derive(Clone, Debug, Serialize, FromQueryResult, PartialEq, Eq)]
pub struct UnavailabilityView {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub impact: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub status: String,
}

/// `date_from` bounds the start date, `date_to` the end date.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UnavailabilityFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewUnavailability {
    pub employee_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub impact: Option<String>,
    pub status: Option<RequestStatus>,
}

#[instrument(name = "planning.unavailabilities.list", skip_all, fields(role = %caller.role))]
pub async fn list(
    db: &DbPool,
    caller: &UserProfile,
    filter: UnavailabilityFilter,
) -> ApiResult<Vec<UnavailabilityView>> {
    let scope = authorize(caller, Operation::ListUnavailabilities)?;

    let mut query = unavailabilities::Entity::find()
        .select_only()
        .column(unavailabilities::Column::Id)
        .column(unavailabilities::Column::EmployeeId)
        .column(employees::Column::FirstName)
        .column(employees::Column::LastName)
        .column_as(
            text((unavailabilities::Entity, unavailabilities::Column::Kind)),
            "kind",
        )
        .column_as(
            text((unavailabilities::Entity, unavailabilities::Column::Impact)),
            "impact",
        )
        .column(unavailabilities::Column::StartDate)
        .column(unavailabilities::Column::EndDate)
        .column(unavailabilities::Column::StartTime)
        .column(unavailabilities::Column::EndTime)
        .column_as(
            text((unavailabilities::Entity, unavailabilities::Column::Status)),
            "status",
        )
        .join(JoinType::InnerJoin, unavailabilities::Relation::Employee.def());

    match scope {
        RowScope::Nothing => return Ok(Vec::new()),
        RowScope::Employee(id) => {
            query = query.filter(unavailabilities::Column::EmployeeId.eq(id));
        }
        RowScope::All => {}
    }
    if let Some(from) = filter.date_from {
        query = query.filter(unavailabilities::Column::StartDate.gte(from));
    }
    if let Some(to) = filter.date_to {
        query = query.filter(unavailabilities::Column::EndDate.lte(to));
    }

    query
        .order_by_asc(unavailabilities::Column::StartDate)
        .into_model::<UnavailabilityView>()
        .all(db)
        .await
        .map_err(db_error)
}

/// Workers may only file drafts or submissions for themselves; supervisors
/// may not file at all.
#[instrument(name = "planning.unavailabilities.create", skip_all, fields(role = %caller.role))]
pub async fn create(
    db: &DbPool,
    caller: &UserProfile,
    input: NewUnavailability,
) -> ApiResult<Created> {
    let employee_id = required(input.employee_id, "employee_id")?;
    let kind = required(input.kind, "type")?;
    let start_date = required(input.start_date, "start_date")?;
    let end_date = required(input.end_date, "end_date")?;
    let impact = required(input.impact, "impact")?;
    let status = required(input.status, "status")?;
    authorize(
        caller,
        Operation::CreateUnavailability {
            employee_id,
            status,
        },
    )?;

    let id = Uuid::new_v4();
    let statement = Query::insert()
        .into_table(unavailabilities::Entity)
        .columns([
            unavailabilities::Column::Id,
            unavailabilities::Column::EmployeeId,
            unavailabilities::Column::Kind,
            unavailabilities::Column::StartDate,
            unavailabilities::Column::EndDate,
            unavailabilities::Column::StartTime,
            unavailabilities::Column::EndTime,
            unavailabilities::Column::Impact,
            unavailabilities::Column::Status,
            unavailabilities::Column::RequestedBy,
        ])
        .values([
            id.into(),
            employee_id.into(),
            enum_value(kind, UNAVAILABILITY_TYPE),
            start_date.into(),
            end_date.into(),
            input.start_time.into(),
            input.end_time.into(),
            enum_value(impact, AVAILABILITY_IMPACT),
            enum_value(status.as_str(), REQUEST_STATUS),
            caller.user_id.into(),
        ])
        .map_err(|err| ApiError::internal(anyhow::anyhow!("{err:?}")))?
        .to_owned();
    execute(db, &statement)
        .await
        .map_err(|err| write_failed("Insert", err))?;

    info!(unavailability_id = %id, %employee_id, %status, "unavailability created");
    Ok(Created { id })
}
