//! Proportional dividend allocation.
//!
//! Each member's dividend is `value / sum(values) × total`, rounded half away
//! from zero to the currency's minor units. Rounding is applied per member, so
//! the rounded dividends may differ from the total by up to half a unit per
//! member.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::amount::checked_sum;
use crate::dividend::types::{BasisEntry, DividendRecord};
use crate::error::{LedgerError, LedgerResult};

/// Dividend allocation utility.
pub struct DividendAllocator;

impl DividendAllocator {
    /// Allocate `total_profit` across `entries` in proportion to their values.
    ///
    /// A zero basis sum yields zero percent and zero dividend for everyone.
    ///
    /// # Example
    ///
    /// ```
    /// use ikimina_core::dividend::{BasisEntry, DividendAllocator};
    /// use ikimina_shared::types::MemberId;
    /// use rust_decimal_macros::dec;
    ///
    /// let entries: Vec<BasisEntry> = [dec!(40), dec!(30), dec!(20), dec!(10)]
    ///     .into_iter()
    ///     .map(|value| BasisEntry { member_id: MemberId::new(), member_name: String::new(), value })
    ///     .collect();
    /// let records = DividendAllocator::allocate(&entries, dec!(1000), 0).unwrap();
    /// let dividends: Vec<_> = records.iter().map(|r| r.dividend).collect();
    /// assert_eq!(dividends, vec![dec!(400), dec!(300), dec!(200), dec!(100)]);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `Overflow` if the basis sum or a share leaves the decimal range.
    pub fn allocate(
        entries: &[BasisEntry],
        total_profit: Decimal,
        decimal_places: u32,
    ) -> LedgerResult<Vec<DividendRecord>> {
        let sum = checked_sum(entries.iter().map(|e| e.value), "dividend basis")?;

        entries
            .iter()
            .map(|entry| {
                let (percent, exact) = if sum.is_zero() {
                    (Decimal::ZERO, Decimal::ZERO)
                } else {
                    let percent = entry
                        .value
                        .checked_div(sum)
                        .ok_or(LedgerError::Overflow("dividend percent"))?;
                    // Falls back to percent × total if the product overflows.
                    let exact = entry
                        .value
                        .checked_mul(total_profit)
                        .and_then(|product| product.checked_div(sum))
                        .or_else(|| percent.checked_mul(total_profit))
                        .ok_or(LedgerError::Overflow("dividend"))?;
                    (percent, exact)
                };

                Ok(DividendRecord {
                    member_id: entry.member_id,
                    member_name: entry.member_name.clone(),
                    basis_value: entry.value,
                    percent,
                    dividend: exact.round_dp_with_strategy(
                        decimal_places,
                        RoundingStrategy::MidpointAwayFromZero,
                    ),
                })
            })
            .collect()
    }
}
