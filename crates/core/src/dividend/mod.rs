//! Dividend allocation.
//!
//! Splits a year's profit between members in proportion to a basis (share
//! count or cumulative contributions).

pub mod allocation;
pub mod types;

#[cfg(test)]
mod allocation_props;

pub use allocation::DividendAllocator;
pub use types::{BasisEntry, DividendBasis, DividendRecord, DividendRun};
