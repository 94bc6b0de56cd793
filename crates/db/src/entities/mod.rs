//! `SeaORM` entity definitions.

pub mod prelude;

pub mod contributions;
pub mod dividend_records;
pub mod dividend_runs;
pub mod loans;
pub mod members;
pub mod repayments;
pub mod sea_orm_active_enums;
