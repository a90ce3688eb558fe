use sea_orm::entity::prelude::*;

/// Read-only view of medical visits that are expired or expiring.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "v_medical_visit_alerts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub employee_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub visit_type_code: String,
    pub visit_type_label: Option<String>,
    pub visit_date: Option<Date>,
    pub expires_on: Option<Date>,
    /// EXPIRE, J_30, J_60 or a level outside the alert window.
    pub alert_level: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
