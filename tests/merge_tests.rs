//! Property-based tests for the cash-flow merge.
//!
//! These tests verify the merge invariants hold under random inputs.

use chrono::{Duration, NaiveDate};
use folio_core::*;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

fn to_table(events: &[(i64, i64)]) -> CashFlowTable {
    CashFlowTable::from_events(events.iter().map(|&(offset, cents)| {
        (
            base_date() + Duration::days(offset),
            Cash::new(Decimal::new(cents, 2)),
        )
    }))
}

// Strategies for generating test data
fn events_strategy() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec(
        (
            0i64..60,
            (-1_000_000i64..1_000_000).prop_filter("nonzero", |v| *v != 0),
        ),
        0..12,
    )
}

fn position_set_strategy() -> impl Strategy<Value = Vec<Vec<(i64, i64)>>> {
    prop::collection::vec(events_strategy(), 0..5)
}

proptest! {
    /// Permuting input positions yields an identical merged table.
    #[test]
    fn merge_is_order_independent(
        sets in position_set_strategy(),
        rotation in 0usize..5,
    ) {
        let tables: Vec<CashFlowTable> = sets.iter().map(|s| to_table(s)).collect();

        let merged = CashFlowTable::merge(tables.iter());

        let mut reversed: Vec<&CashFlowTable> = tables.iter().collect();
        reversed.reverse();
        prop_assert_eq!(&merged, &CashFlowTable::merge(reversed));

        if !tables.is_empty() {
            let k = rotation % tables.len();
            let rotated = tables[k..].iter().chain(tables[..k].iter());
            prop_assert_eq!(&merged, &CashFlowTable::merge(rotated));
        }
    }

    /// No merged-table entry has amount exactly zero, and dates strictly increase.
    #[test]
    fn merged_table_invariants(sets in position_set_strategy()) {
        let tables: Vec<CashFlowTable> = sets.iter().map(|s| to_table(s)).collect();
        let merged = CashFlowTable::merge(tables.iter());

        for ev in merged.iter() {
            prop_assert!(!ev.amount.is_zero());
        }
        for pair in merged.events().windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
    }

    /// Sum of merged amounts over any date range equals the sum of all source
    /// amounts in that range.
    #[test]
    fn merge_conserves_money(
        sets in position_set_strategy(),
        lo in 0i64..60,
        span in 0i64..60,
    ) {
        let tables: Vec<CashFlowTable> = sets.iter().map(|s| to_table(s)).collect();
        let merged = CashFlowTable::merge(tables.iter());

        let start = base_date() + Duration::days(lo);
        let end = base_date() + Duration::days(lo + span);

        let merged_sum: Cash = merged
            .iter()
            .filter(|ev| ev.date >= start && ev.date <= end)
            .map(|ev| ev.amount)
            .sum();
        let source_sum: Cash = tables
            .iter()
            .flat_map(|t| t.iter())
            .filter(|ev| ev.date >= start && ev.date <= end)
            .map(|ev| ev.amount)
            .sum();

        prop_assert_eq!(merged_sum, source_sum);
    }

    /// Merging one table is the identity (its own grouping already applied).
    #[test]
    fn merge_of_single_table_is_identity(events in events_strategy()) {
        let table = to_table(&events);
        prop_assert_eq!(CashFlowTable::merge([&table]), table);
    }
}
