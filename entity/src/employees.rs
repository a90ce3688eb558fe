use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Assignment,
    Unavailability,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Assignment => Entity::has_many(super::assignments::Entity).into(),
            Relation::Unavailability => Entity::has_many(super::unavailabilities::Entity).into(),
        }
    }
}

impl Related<super::assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::unavailabilities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Unavailability.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
