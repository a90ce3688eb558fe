use crate::employees;
use sea_orm::entity::prelude::*;

/// One staffed slot. The store keeps `(employee_id, assign_date, activity,
/// role, shift)` unique.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    pub activity: String,
    pub assign_date: Date,
    pub role: String,
    pub shift: String,
    pub is_pf: bool,
    pub status: String,
    pub created_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "employees::Entity",
        from = "Column::EmployeeId",
        to = "employees::Column::Id",
        on_delete = "Cascade"
    )]
    Employee,
}

impl Related<employees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
