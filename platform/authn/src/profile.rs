use entity::user_profiles;
use platform_authz::AppRole;
use platform_db::DbPool;
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, QueryFilter, QuerySelect,
    sea_query::{Alias, Expr},
};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::AuthnError;

/// The authorization record of the caller, loaded once per request.
#[derive(Clone, Debug, Serialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: AppRole,
    pub employee_id: Option<Uuid>,
    pub display_name: Option<String>,
}

#[derive(Debug, FromQueryResult)]
struct ProfileRow {
    role: String,
    employee_id: Option<Uuid>,
    display_name: Option<String>,
    /// Only an explicit `false` disables; NULL counts as active.
    is_active: Option<bool>,
}

#[derive(Clone)]
pub struct ProfileLoader {
    db: DbPool,
}

impl ProfileLoader {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Look up the profile for a verified subject. `email` comes from the
    /// token and is carried through untouched.
    pub async fn load(
        &self,
        subject_id: &str,
        email: Option<String>,
    ) -> Result<UserProfile, AuthnError> {
        // Subjects that are not UUIDs can never have been provisioned.
        let Ok(user_id) = Uuid::parse_str(subject_id) else {
            debug!(subject = subject_id, "subject is not a uuid");
            return Err(AuthnError::NoProfile);
        };

        let row = user_profiles::Entity::find()
            .select_only()
            .column_as(
                Expr::col((user_profiles::Entity, user_profiles::Column::Role))
                    .cast_as(Alias::new("text")),
                "role",
            )
            .column(user_profiles::Column::EmployeeId)
            .column(user_profiles::Column::DisplayName)
            .column(user_profiles::Column::IsActive)
            .filter(user_profiles::Column::UserId.eq(user_id))
            .into_model::<ProfileRow>()
            .one(&self.db)
            .await?
            .ok_or(AuthnError::NoProfile)?;

        if row.is_active == Some(false) {
            return Err(AuthnError::ProfileDisabled);
        }
        let role = row
            .role
            .parse::<AppRole>()
            .map_err(|_| AuthnError::UnknownRole(row.role.clone()))?;

        Ok(UserProfile {
            user_id,
            email,
            role,
            employee_id: row.employee_id,
            display_name: row.display_name,
        })
    }
}
