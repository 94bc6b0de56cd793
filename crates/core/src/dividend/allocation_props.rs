//! Property-based tests for dividend allocation.

use ikimina_shared::types::MemberId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::dividend::allocation::DividendAllocator;
use crate::dividend::types::BasisEntry;

fn arb_entries() -> impl Strategy<Value = Vec<BasisEntry>> {
    prop::collection::vec(0u32..10_000, 1..30).prop_map(|values| {
        values
            .into_iter()
            .map(|v| BasisEntry {
                member_id: MemberId::new(),
                member_name: String::new(),
                value: Decimal::from(v),
            })
            .collect()
    })
}

fn arb_profit() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000).prop_map(Decimal::from)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Rounded dividends stay within half a unit per member of the profit.
    #[test]
    fn prop_sum_within_rounding_tolerance(entries in arb_entries(), profit in arb_profit()) {
        let records = DividendAllocator::allocate(&entries, profit, 0).unwrap();
        let basis_sum: Decimal = entries.iter().map(|e| e.value).sum();
        let distributed: Decimal = records.iter().map(|r| r.dividend).sum();

        if basis_sum.is_zero() {
            prop_assert!(distributed.is_zero());
        } else {
            let tolerance = Decimal::from(records.len()) * Decimal::new(5, 1);
            prop_assert!((distributed - profit).abs() <= tolerance);
        }
    }

    /// Every record is non-negative, follows its entry, and percents sum to 1 (or 0).
    #[test]
    fn prop_records_follow_entries(entries in arb_entries(), profit in arb_profit()) {
        let records = DividendAllocator::allocate(&entries, profit, 0).unwrap();
        prop_assert_eq!(records.len(), entries.len());

        for (record, entry) in records.iter().zip(&entries) {
            prop_assert_eq!(record.member_id, entry.member_id);
            prop_assert_eq!(record.basis_value, entry.value);
            prop_assert!(record.dividend >= Decimal::ZERO);
            prop_assert!(record.dividend <= profit);
        }

        let percent_sum: Decimal = records.iter().map(|r| r.percent).sum();
        if entries.iter().all(|e| e.value.is_zero()) {
            prop_assert!(percent_sum.is_zero());
        } else {
            prop_assert!((percent_sum - Decimal::ONE).abs() < Decimal::new(1, 20));
        }
    }

    /// The allocation is a pure function of its inputs.
    #[test]
    fn prop_deterministic(entries in arb_entries(), profit in arb_profit()) {
        prop_assert_eq!(
            DividendAllocator::allocate(&entries, profit, 0).unwrap(),
            DividendAllocator::allocate(&entries, profit, 0).unwrap()
        );
    }
}
