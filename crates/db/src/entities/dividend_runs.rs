//! `SeaORM` Entity for dividend_runs table.

use super::sea_orm_active_enums::DividendBasis;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "dividend_runs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub year: i32,
    pub basis: DividendBasis,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_profit: Decimal,
    pub computed_on: Date,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::dividend_records::Entity")]
    DividendRecords,
}

impl Related<super::dividend_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DividendRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
