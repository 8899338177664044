// 5.0: status tables. the dated ledger of trade quantities whose columns
// enumerate position codes. quantity convention (kept throughout the crate):
// positive = a purchase expressed in currency, negative = a redemption
// expressed in asset units.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRow {
    pub date: NaiveDate,
    pub amounts: Vec<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTable {
    pub codes: Vec<String>,
    pub rows: Vec<StatusRow>,
}

impl StatusTable {
    pub fn new(codes: Vec<String>, mut rows: Vec<StatusRow>) -> Self {
        rows.sort_by_key(|r| r.date);
        Self { codes, rows }
    }

    // trade quantities for one code, zero rows skipped
    pub fn series_for(&self, code: &str) -> Option<TradeSeries> {
        let col = self.codes.iter().position(|c| c == code)?;
        let rows = self
            .rows
            .iter()
            .filter_map(|row| {
                let qty = *row.amounts.get(col)?;
                if qty.is_zero() {
                    None
                } else {
                    Some((row.date, qty))
                }
            })
            .collect();
        Some(TradeSeries { rows })
    }
}

// 5.1: single-asset trade quantities by date. this is also the shape the
// closed-system synthesizer emits for the virtual cash leg.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSeries {
    pub rows: Vec<(NaiveDate, Decimal)>,
}

impl TradeSeries {
    pub fn new(rows: Vec<(NaiveDate, Decimal)>) -> Self {
        Self { rows }
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|(date, _)| *date)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn series_for_extracts_column() {
        let status = StatusTable::new(
            vec!["000001".to_string(), "000198".to_string()],
            vec![
                StatusRow {
                    date: d("2020-03-01"),
                    amounts: vec![dec!(100), dec!(50)],
                },
                StatusRow {
                    date: d("2020-03-02"),
                    amounts: vec![dec!(0), dec!(-30)],
                },
            ],
        );

        let series = status.series_for("000198").unwrap();
        assert_eq!(
            series.rows,
            vec![(d("2020-03-01"), dec!(50)), (d("2020-03-02"), dec!(-30))]
        );

        // zero quantities are not trades
        let series = status.series_for("000001").unwrap();
        assert_eq!(series.rows, vec![(d("2020-03-01"), dec!(100))]);

        assert!(status.series_for("999999").is_none());
    }

    #[test]
    fn rows_sorted_on_construction() {
        let status = StatusTable::new(
            vec!["000001".to_string()],
            vec![
                StatusRow {
                    date: d("2020-03-05"),
                    amounts: vec![dec!(10)],
                },
                StatusRow {
                    date: d("2020-03-01"),
                    amounts: vec![dec!(20)],
                },
            ],
        );
        assert_eq!(status.rows[0].date, d("2020-03-01"));
    }
}
