use crate::employees;
use sea_orm::entity::prelude::*;

/// Authorization record keyed by the identity provider's subject id.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    /// `app_role` domain: SALARIE, CHEF_CHANTIER or RESPONSABLE.
    pub role: String,
    pub employee_id: Option<Uuid>,
    pub display_name: Option<String>,
    /// NULL is treated as active.
    pub is_active: Option<bool>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "employees::Entity",
        from = "Column::EmployeeId",
        to = "employees::Column::Id"
    )]
    Employee,
}

impl Related<employees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
