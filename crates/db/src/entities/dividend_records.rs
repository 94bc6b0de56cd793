//! `SeaORM` Entity for dividend_records table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "dividend_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub run_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub position: i32,
    pub member_id: Uuid,
    pub member_name: String,
    #[sea_orm(column_type = "Decimal(None)")]
    pub basis_value: Decimal,
    #[sea_orm(column_type = "Decimal(None)")]
    pub percent: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub dividend: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dividend_runs::Entity",
        from = "Column::RunId",
        to = "super::dividend_runs::Column::Id"
    )]
    DividendRuns,
}

impl Related<super::dividend_runs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DividendRuns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
