//! Property-based tests for engine bookkeeping.

use chrono::NaiveDate;
use ikimina_shared::LedgerConfig;
use ikimina_shared::types::{ContributionId, PageRequest};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::ledger::engine::LedgerEngine;
use crate::ledger::memory::MemoryStore;
use crate::member::NewMember;

#[derive(Debug, Clone)]
enum Op {
    Record(i64),
    /// Reverse the n-th live contribution (modulo the live count).
    Reverse(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1i64..100_000).prop_map(Op::Record),
        1 => any::<usize>().prop_map(Op::Reverse),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Savings balance always equals the sum of the contributions still on file.
    #[test]
    fn prop_balance_matches_live_contributions(ops in prop::collection::vec(arb_op(), 1..40)) {
        runtime().block_on(async {
            let engine = LedgerEngine::new(MemoryStore::new(), LedgerConfig::default());
            let member = engine
                .register_member(NewMember {
                    name: "Property".to_string(),
                    phone: "+250788000000".to_string(),
                    shares: 1,
                    opening_savings: Decimal::ZERO,
                    joined_on: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                })
                .await
                .unwrap();

            let mut live: Vec<(ContributionId, Decimal)> = Vec::new();
            for op in ops {
                match op {
                    Op::Record(amount) => {
                        let amount = Decimal::from(amount);
                        let date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
                        let c = engine
                            .record_contribution(member.id, amount, date, None)
                            .await
                            .unwrap();
                        live.push((c.id, amount));
                    }
                    Op::Reverse(n) => {
                        if live.is_empty() {
                            continue;
                        }
                        let (id, _) = live.remove(n % live.len());
                        engine.reverse_contribution(id).await.unwrap();
                    }
                }

                let expected: Decimal = live.iter().map(|(_, amount)| *amount).sum();
                let balance = engine.member(member.id).await.unwrap().savings_balance;
                prop_assert_eq!(balance, expected);
            }

            let journal = engine
                .contributions(member.id, PageRequest::new(1, 1000))
                .await
                .unwrap();
            prop_assert_eq!(journal.data.len(), live.len());
            Ok(())
        })?;
    }
}
