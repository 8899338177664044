// 2.0: cash-flow tables. the chronological record of money moving between the
// investor and one or many positions, and the merge that combines several
// positions' tables into one.
//
// table invariants: strictly increasing dates, each date at most once, no
// zero amounts. every constructor normalizes through an ordered map, so a
// table violating the invariants cannot be built.

use crate::types::Cash;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowEvent {
    pub date: NaiveDate,
    pub amount: Cash,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowTable {
    events: Vec<CashFlowEvent>,
}

impl CashFlowTable {
    pub fn empty() -> Self {
        Self { events: Vec::new() }
    }

    // 2.1: grouped-sum construction. same-date amounts collapse into one
    // entry; entries summing to exactly zero are dropped.
    pub fn from_events(events: impl IntoIterator<Item = (NaiveDate, Cash)>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for (date, amount) in events {
            *by_date.entry(date).or_insert(Decimal::ZERO) += amount.value();
        }
        let events = by_date
            .into_iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(date, amount)| CashFlowEvent {
                date,
                amount: Cash::new(amount),
            })
            .collect();
        Self { events }
    }

    // 2.2: the merger. grouped sum across tables, not a concatenation, so the
    // result is independent of input order. zero tables merge to an empty table.
    pub fn merge<'a>(tables: impl IntoIterator<Item = &'a CashFlowTable>) -> Self {
        Self::from_events(
            tables
                .into_iter()
                .flat_map(|t| t.events.iter().map(|ev| (ev.date, ev.amount))),
        )
    }

    // prefix of the table with dates at or before `as_of`
    pub fn truncated(&self, as_of: NaiveDate) -> Self {
        let end = self.events.partition_point(|ev| ev.date <= as_of);
        Self {
            events: self.events[..end].to_vec(),
        }
    }

    pub fn events(&self) -> &[CashFlowEvent] {
        &self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = &CashFlowEvent> {
        self.events.iter()
    }

    pub fn first(&self) -> Option<&CashFlowEvent> {
        self.events.first()
    }

    pub fn last(&self) -> Option<&CashFlowEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn total(&self) -> Cash {
        self.events.iter().map(|ev| ev.amount).sum()
    }

    // money pushed into the system: magnitude of all negative flows
    pub fn total_in(&self) -> Cash {
        self.events
            .iter()
            .filter(|ev| ev.amount.is_negative())
            .map(|ev| ev.amount.negate())
            .sum()
    }

    // money returned from the system: sum of all positive flows
    pub fn total_out(&self) -> Cash {
        self.events
            .iter()
            .filter(|ev| !ev.amount.is_negative())
            .map(|ev| ev.amount)
            .sum()
    }
}
