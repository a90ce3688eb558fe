use entity::employees;
use platform_api::{ApiError, ApiResult};
use platform_authn::UserProfile;
use platform_authz::{Operation, RowScope};
use platform_db::DbPool;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    Created,
    support::{authorize, db_error, required, write_failed},
};

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct EmployeeView {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
}

impl From<employees::Model> for EmployeeView {
    fn from(model: employees::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone: model.phone,
            is_active: model.is_active,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewEmployee {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Managers and supervisors see the active staff; a worker sees their own
/// record whatever its state.
#[instrument(name = "planning.employees.list", skip_all, fields(role = %caller.role))]
pub async fn list(db: &DbPool, caller: &UserProfile) -> ApiResult<Vec<EmployeeView>> {
    let query = match authorize(caller, Operation::ListEmployees)? {
        RowScope::Nothing => return Ok(Vec::new()),
        RowScope::Employee(id) => employees::Entity::find_by_id(id),
        RowScope::All => employees::Entity::find()
            .filter(employees::Column::IsActive.eq(true))
            .order_by_asc(employees::Column::LastName)
            .order_by_asc(employees::Column::FirstName),
    };
    let rows = query.all(db).await.map_err(db_error)?;
    Ok(rows.into_iter().map(EmployeeView::from).collect())
}

#[instrument(name = "planning.employees.create", skip_all, fields(role = %caller.role))]
pub async fn create(db: &DbPool, caller: &UserProfile, input: NewEmployee) -> ApiResult<Created> {
    let first_name = non_blank(input.first_name, "first_name")?;
    let last_name = non_blank(input.last_name, "last_name")?;
    authorize(caller, Operation::CreateEmployee)?;

    let id = Uuid::new_v4();
    let model = employees::ActiveModel {
        id: Set(id),
        first_name: Set(first_name),
        last_name: Set(last_name),
        email: Set(input.email),
        phone: Set(input.phone),
        is_active: Set(true),
    };
    employees::Entity::insert(model)
        .exec_without_returning(db)
        .await
        .map_err(|err| write_failed("Insert", err))?;

    info!(employee_id = %id, "employee created");
    Ok(Created { id })
}

fn non_blank(value: Option<String>, field: &str) -> ApiResult<String> {
    let trimmed = required(value, field)?.trim().to_string();
    if trimmed.is_empty() {
        return Err(ApiError::missing_field(field));
    }
    Ok(trimmed)
}
