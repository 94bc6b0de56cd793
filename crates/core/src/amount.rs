//! Bounds on monetary amounts and rates.
//!
//! Money columns are `NUMERIC(19, 4)` and interest rates `NUMERIC(9, 6)`.
//! Every amount the engine accepts fits its column exactly, so what a caller
//! gets back is what the store keeps.

use rust_decimal::Decimal;

use crate::error::{LedgerError, LedgerResult};

/// Largest whole amount a money column holds (15 integer digits).
const MAX_WHOLE_AMOUNT: i64 = 999_999_999_999_999;

/// Decimal places a money column keeps.
pub const STORED_DECIMAL_PLACES: u32 = 4;

/// Decimal places an interest rate column keeps.
pub const RATE_DECIMAL_PLACES: u32 = 6;

/// Rates must stay below this bound.
const RATE_CEILING: i64 = 1000;

/// Longest loan term in months.
pub const MAX_TERM_MONTHS: u32 = 600;

/// Largest storable amount.
#[must_use]
pub fn max_amount() -> Decimal {
    Decimal::new(MAX_WHOLE_AMOUNT, 0)
}

/// Checks that `amount` fits a money column and has at most
/// `decimal_places` decimal places (capped at [`STORED_DECIMAL_PLACES`]).
///
/// Sign is not checked here.
///
/// # Errors
///
/// `TooManyDecimalPlaces` or `AmountOutOfRange`.
pub fn check_amount(amount: Decimal, decimal_places: u32) -> LedgerResult<()> {
    let decimal_places = decimal_places.min(STORED_DECIMAL_PLACES);
    if amount.normalize().scale() > decimal_places {
        return Err(LedgerError::TooManyDecimalPlaces {
            amount,
            decimal_places,
        });
    }
    if amount.abs() > max_amount() {
        return Err(LedgerError::AmountOutOfRange(amount));
    }
    Ok(())
}

/// Checks that a non-negative `rate` fits the interest rate column.
///
/// # Errors
///
/// `InterestRateOutOfRange`.
pub fn check_rate(rate: Decimal) -> LedgerResult<()> {
    if rate.normalize().scale() > RATE_DECIMAL_PLACES || rate >= Decimal::from(RATE_CEILING) {
        return Err(LedgerError::InterestRateOutOfRange(rate));
    }
    Ok(())
}

/// `a + b`, or `None` if the sum leaves the storable range.
#[must_use]
pub fn add_within_limit(a: Decimal, b: Decimal) -> Option<Decimal> {
    a.checked_add(b).filter(|sum| sum.abs() <= max_amount())
}

/// Sums `values`, failing with `Overflow(what)` if the decimal range is exceeded.
///
/// # Errors
///
/// `Overflow`.
pub fn checked_sum(
    values: impl IntoIterator<Item = Decimal>,
    what: &'static str,
) -> LedgerResult<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, Decimal::checked_add)
        .ok_or(LedgerError::Overflow(what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(100), 0)]
    #[case(dec!(100.00), 0)]
    #[case(dec!(12.5), 2)]
    #[case(dec!(0.0001), 4)]
    #[case(dec!(999999999999999), 0)]
    fn test_amount_accepted(#[case] amount: Decimal, #[case] decimal_places: u32) {
        assert!(check_amount(amount, decimal_places).is_ok());
    }

    #[test]
    fn test_amount_too_precise() {
        let err = check_amount(dec!(1.5), 0).unwrap_err();
        assert!(matches!(err, LedgerError::TooManyDecimalPlaces { decimal_places: 0, .. }));

        let err = check_amount(dec!(1.23456), 8).unwrap_err();
        assert!(matches!(err, LedgerError::TooManyDecimalPlaces { decimal_places: 4, .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidAmount);
    }

    #[test]
    fn test_amount_too_large() {
        let err = check_amount(dec!(1000000000000000), 0).unwrap_err();
        assert!(matches!(err, LedgerError::AmountOutOfRange(_)));
        assert!(check_amount(Decimal::MAX, 0).is_err());
    }

    #[rstest]
    #[case(dec!(0), true)]
    #[case(dec!(0.025), true)]
    #[case(dec!(999.999999), true)]
    #[case(dec!(1000), false)]
    #[case(dec!(0.0000001), false)]
    fn test_rate_bounds(#[case] rate: Decimal, #[case] ok: bool) {
        assert_eq!(check_rate(rate).is_ok(), ok);
    }

    #[test]
    fn test_add_within_limit() {
        assert_eq!(add_within_limit(dec!(1), dec!(2)), Some(dec!(3)));
        assert_eq!(add_within_limit(max_amount(), dec!(1)), None);
        assert_eq!(add_within_limit(Decimal::MAX, Decimal::MAX), None);
    }

    #[test]
    fn test_checked_sum_overflow() {
        assert_eq!(checked_sum([dec!(1), dec!(2)], "t").unwrap(), dec!(3));
        let err = checked_sum([Decimal::MAX, Decimal::MAX], "total savings").unwrap_err();
        assert!(matches!(err, LedgerError::Overflow("total savings")));
        assert_eq!(err.kind(), ErrorKind::Inconsistent);
    }
}
