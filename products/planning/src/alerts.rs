use chrono::NaiveDate;
use entity::{coverage_alerts, medical_alerts};
use platform_api::ApiResult;
use platform_authn::UserProfile;
use platform_authz::Operation;
use platform_db::DbPool;
use sea_orm::{
    EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
    sea_query::{Alias, Expr, NullOrdering, Order},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::support::{authorize, check_limit, db_error, text};

pub const DEFAULT_ACTIVITY: &str = "ME1";
pub const DEFAULT_COVERAGE_LIMIT: u64 = 60;
pub const DEFAULT_MEDICAL_LIMIT: u64 = 200;

/// Levels inside the alert window; anything else in the view is ignored.
pub const MEDICAL_ALERT_LEVELS: [&str; 3] = ["EXPIRE", "J_30", "J_60"];

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CoverageQuery {
    pub activity: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MedicalQuery {
    pub limit: Option<u64>,
}

#[derive(Clone, Debug, Serialize, FromQueryResult, PartialEq)]
pub struct CoverageAlertView {
    pub activity: String,
    pub day_date: NaiveDate,
    pub mode: String,
    pub missing_total: i64,
    pub missing_items: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, FromQueryResult, PartialEq, Eq)]
pub struct MedicalAlertView {
    pub employee_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub visit_type_code: String,
    pub visit_type_label: Option<String>,
    pub visit_date: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
    pub alert_level: String,
}

/// Daily coverage gaps for one activity, oldest day first.
#[instrument(name = "planning.alerts.coverage", skip_all, fields(role = %caller.role))]
pub async fn coverage_daily(
    db: &DbPool,
    caller: &UserProfile,
    query: CoverageQuery,
) -> ApiResult<Vec<CoverageAlertView>> {
    authorize(caller, Operation::ReadCoverageAlerts)?;
    let limit = check_limit(query.limit.unwrap_or(DEFAULT_COVERAGE_LIMIT))?;
    let activity = query
        .activity
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| DEFAULT_ACTIVITY.to_string());

    coverage_alerts::Entity::find()
        .select_only()
        .column_as(text(coverage_alerts::Column::Activity), "activity")
        .column(coverage_alerts::Column::DayDate)
        .column_as(text(coverage_alerts::Column::Mode), "mode")
        .column_as(
            Expr::col(coverage_alerts::Column::MissingTotal).cast_as(Alias::new("bigint")),
            "missing_total",
        )
        .column(coverage_alerts::Column::MissingItems)
        .filter(Expr::expr(text(coverage_alerts::Column::Activity)).eq(activity))
        .order_by_asc(coverage_alerts::Column::DayDate)
        .limit(limit)
        .into_model::<CoverageAlertView>()
        .all(db)
        .await
        .map_err(db_error)
}

/// Expired or soon-expiring medical visits; rows without an expiry come last.
#[instrument(name = "planning.alerts.medical", skip_all, fields(role = %caller.role))]
pub async fn medical(
    db: &DbPool,
    caller: &UserProfile,
    query: MedicalQuery,
) -> ApiResult<Vec<MedicalAlertView>> {
    authorize(caller, Operation::ReadMedicalAlerts)?;
    let limit = check_limit(query.limit.unwrap_or(DEFAULT_MEDICAL_LIMIT))?;

    let mut select = medical_alerts::Entity::find()
        .select_only()
        .column(medical_alerts::Column::EmployeeId)
        .column(medical_alerts::Column::FirstName)
        .column(medical_alerts::Column::LastName)
        .column(medical_alerts::Column::VisitTypeCode)
        .column(medical_alerts::Column::VisitTypeLabel)
        .column(medical_alerts::Column::VisitDate)
        .column(medical_alerts::Column::ExpiresOn)
        .column_as(text(medical_alerts::Column::AlertLevel), "alert_level")
        .filter(Expr::expr(text(medical_alerts::Column::AlertLevel)).is_in(MEDICAL_ALERT_LEVELS))
        .limit(limit);
    QueryTrait::query(&mut select).order_by_with_nulls(
        medical_alerts::Column::ExpiresOn,
        Order::Asc,
        NullOrdering::Last,
    );

    select
        .into_model::<MedicalAlertView>()
        .all(db)
        .await
        .map_err(db_error)
}
