use sea_orm::entity::prelude::*;

/// Read-only view maintained by the reporting side.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "v_coverage_alerts_daily_summary")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub activity: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub day_date: Date,
    pub mode: String,
    pub missing_total: i64,
    pub missing_items: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
