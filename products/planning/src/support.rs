use platform_api::{ApiError, ApiResult};
use platform_authn::UserProfile;
use platform_authz::{Operation, RowScope, decide};
use platform_db::{DbPool, WriteFailure, classify_write_error};
use sea_orm::{
    ConnectionTrait, DbErr, StatementBuilder,
    sea_query::{Alias, Expr, IntoColumnRef, SimpleExpr},
};
use tracing::warn;

pub(crate) const ACTIVITY_TYPE: &str = "activity_type";
pub(crate) const ROLE_CODE: &str = "role_code";
pub(crate) const SHIFT_CODE: &str = "shift_code";
pub(crate) const REQUEST_STATUS: &str = "request_status";
pub(crate) const UNAVAILABILITY_TYPE: &str = "unavailability_type";
pub(crate) const AVAILABILITY_IMPACT: &str = "availability_impact";

/// Row ceiling for the alert views.
pub(crate) const MAX_LIMIT: u64 = 1000;

/// Ask the policy; denials are logged and returned as `Forbidden`.
pub(crate) fn authorize(caller: &UserProfile, operation: Operation) -> ApiResult<RowScope> {
    decide(caller.role, caller.employee_id, operation)
        .into_result()
        .map_err(|denial| {
            warn!(
                operation = operation.name(),
                role = %caller.role,
                user_id = %caller.user_id,
                reason = %denial,
                "request denied"
            );
            ApiError::from(denial)
        })
}

pub(crate) fn required<T>(value: Option<T>, field: &str) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::missing_field(field))
}

/// An enum-typed column read back as plain text.
pub(crate) fn text(column: impl IntoColumnRef) -> SimpleExpr {
    Expr::col(column).cast_as(Alias::new("text"))
}

/// A value bound for an enum-typed column. Only PostgreSQL renders the cast.
pub(crate) fn enum_value(value: impl Into<String>, domain: &str) -> SimpleExpr {
    Expr::val(value.into()).as_enum(Alias::new(domain))
}

pub(crate) fn db_error(err: DbErr) -> ApiError {
    ApiError::internal(err.into())
}

/// Map a failed write: rejections by the store are the caller's problem,
/// connectivity is ours.
pub(crate) fn write_failed(action: &str, err: DbErr) -> ApiError {
    match classify_write_error(&err) {
        WriteFailure::Conflict => {
            ApiError::bad_request(format!("{action} failed: conflict with an existing row: {err}"))
        }
        WriteFailure::Rejected => ApiError::bad_request(format!("{action} failed: {err}")),
        WriteFailure::Unavailable => db_error(err),
    }
}

/// Run a sea-query statement on the pool's backend; returns rows affected.
pub(crate) async fn execute<S>(db: &DbPool, statement: &S) -> Result<u64, DbErr>
where
    S: StatementBuilder,
{
    let backend = db.get_database_backend();
    let result = db.execute(backend.build(statement)).await?;
    Ok(result.rows_affected())
}

pub(crate) fn check_limit(limit: u64) -> ApiResult<u64> {
    if (1..=MAX_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(ApiError::bad_request(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )))
    }
}
