//! Aggregation reports: tot, combsummary, and automatic construction from a
//! status table with the classify-then-retry protocol.

use chrono::NaiveDate;
use folio_core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn point(date: &str, nv: Decimal) -> PricePoint {
    PricePoint {
        date: d(date),
        net_value: NetValue::new_unchecked(nv),
    }
}

fn growth_asset() -> FundAsset {
    FundAsset {
        code: "000001".to_string(),
        name: "demo growth".to_string(),
        kind: FundKind::RegularFund,
        prices: PriceSeries::from_points(vec![
            point("2020-03-02", dec!(1.00)),
            point("2020-04-01", dec!(1.10)),
            point("2020-05-04", dec!(1.20)),
        ]),
        rounding: Rounding::HalfUp,
    }
}

fn money_asset() -> FundAsset {
    FundAsset {
        code: "000198".to_string(),
        name: "demo money".to_string(),
        kind: FundKind::MoneyMarketFund,
        prices: PriceSeries::from_points(vec![
            point("2020-03-02", dec!(1.000)),
            point("2020-05-04", dec!(1.004)),
        ]),
        rounding: Rounding::HalfDown,
    }
}

fn demo_status() -> StatusTable {
    StatusTable::new(
        vec!["000001".to_string(), "000198".to_string()],
        vec![
            StatusRow {
                date: d("2020-03-02"),
                amounts: vec![dec!(1000), dec!(500)],
            },
            StatusRow {
                date: d("2020-04-01"),
                amounts: vec![dec!(-200), dec!(0)],
            },
        ],
    )
}

fn demo_portfolio() -> Portfolio {
    let source = LedgerSource::new(vec![growth_asset(), money_asset()]);
    Portfolio::from_status(&demo_status(), &source).unwrap()
}

#[test]
fn tot_sums_one_column_across_positions() {
    let portfolio = demo_portfolio();
    let as_of = d("2020-05-04");

    let per_position: Decimal = portfolio
        .positions()
        .iter()
        .map(|p| p.current_value(as_of).value())
        .sum();
    assert_eq!(portfolio.tot("currentvalue", as_of).unwrap(), per_position);

    // purchases: 1000 + 500 on 03-02 only
    assert_eq!(portfolio.tot("totalpurchase", as_of).unwrap(), dec!(1500));
}

#[test]
fn tot_rejects_unknown_metric() {
    let portfolio = demo_portfolio();
    let err = portfolio.tot("sharpe", d("2020-05-04")).unwrap_err();
    assert!(matches!(err, MetricError::Unknown { name } if name == "sharpe"));
}

#[test]
fn combsummary_total_row_matches_tot() {
    let portfolio = demo_portfolio();
    let as_of = d("2020-05-04");
    let summary = portfolio.combsummary(as_of, &StandardFlowStats);

    let total = summary.total_row().unwrap();
    assert_eq!(
        total.current_value.value(),
        portfolio.tot("currentvalue", as_of).unwrap()
    );
    assert_eq!(
        total.total_profit.value(),
        portfolio.tot("totalprofit", as_of).unwrap()
    );

    // one row per position plus the total
    assert_eq!(summary.rows.len(), portfolio.positions().len() + 1);
    assert_eq!(summary.position_rows().count(), portfolio.positions().len());
}

#[test]
fn combsummary_total_row_recomputes_systemic_columns() {
    let portfolio = demo_portfolio();
    let as_of = d("2020-05-04");
    let summary = portfolio.combsummary(as_of, &StandardFlowStats);
    let total = summary.total_row().unwrap();

    let cut = portfolio.cash_flow_table().truncated(as_of);
    assert_eq!(total.peak_exposure, peak_exposure(&cut));
    assert_eq!(total.turnover_rate, turnover_rate(&cut, as_of));

    // systemic, not additive: the per-position peaks sum higher than or equal
    // to the system peak, never lower
    let summed: Cash = summary.position_rows().map(|r| r.peak_exposure).sum();
    assert!(summed >= total.peak_exposure);

    // unit-level columns have no portfolio meaning
    assert_eq!(total.unit_net_value, None);
    assert_eq!(total.unit_cost, None);
    assert_eq!(total.shares_held, None);
}

#[test]
fn combsummary_sorted_descending_by_current_value() {
    let portfolio = demo_portfolio();
    let summary = portfolio.combsummary(d("2020-05-04"), &StandardFlowStats);

    for pair in summary.rows.windows(2) {
        assert!(pair[0].current_value >= pair[1].current_value);
    }
    // the total row is the largest, so the sort puts it first
    assert!(summary.rows[0].is_total_row());
}

#[test]
fn from_status_builds_one_position_per_code() {
    let portfolio = demo_portfolio();
    assert_eq!(portfolio.positions().len(), 2);

    let codes: Vec<&str> = portfolio.positions().iter().map(|p| p.code()).collect();
    assert_eq!(codes, vec!["000001", "000198"]);

    // merged: 03-02 → -1500; 04-01 → +220 (200 shares sold at nv 1.10)
    let table = portfolio.cash_flow_table();
    assert_eq!(table.len(), 2);
    assert_eq!(table.events()[0].amount.value(), dec!(-1500));
    assert_eq!(table.events()[1].amount.value(), dec!(220.0));
}

/// Source whose first classification guess is always wrong, to drive the
/// retry-with-alternate-kind path.
struct MisclassifyingSource(LedgerSource);

impl PositionSource for MisclassifyingSource {
    fn classify(&self, code: &str) -> FundKind {
        self.0.classify(code).alternate()
    }

    fn build(
        &self,
        code: &str,
        kind: FundKind,
        status: &StatusTable,
    ) -> Result<Arc<dyn Position>, SourceError> {
        self.0.build(code, kind, status)
    }
}

#[test]
fn kind_mismatch_retries_with_alternate() {
    let source = MisclassifyingSource(LedgerSource::new(vec![growth_asset(), money_asset()]));
    let portfolio = Portfolio::from_status(&demo_status(), &source).unwrap();
    assert_eq!(portfolio.positions().len(), 2);
}

/// Source that mismatches on every kind: the retry must not loop, the second
/// failure propagates.
struct HopelessSource;

impl PositionSource for HopelessSource {
    fn classify(&self, _code: &str) -> FundKind {
        FundKind::RegularFund
    }

    fn build(
        &self,
        code: &str,
        kind: FundKind,
        _status: &StatusTable,
    ) -> Result<Arc<dyn Position>, SourceError> {
        Err(SourceError::KindMismatch {
            code: code.to_string(),
            tried: kind,
        })
    }
}

#[test]
fn double_kind_mismatch_propagates() {
    let result = Portfolio::from_status(&demo_status(), &HopelessSource);
    assert!(matches!(result, Err(SourceError::KindMismatch { .. })));
}

#[test]
fn xirr_rate_delegates_over_aggregate_table() {
    let portfolio = demo_portfolio();
    let rate = portfolio
        .xirr_rate(d("2020-05-04"), dec!(0.1), &StandardFlowStats)
        .unwrap();

    // the system gained value, so the rate is positive
    assert!(rate > Decimal::ZERO, "rate = {rate}");
}

#[test]
fn summary_row_serializes() {
    let portfolio = demo_portfolio();
    let summary = portfolio.combsummary(d("2020-05-04"), &StandardFlowStats);
    let json = serde_json::to_string(&summary).unwrap();
    let back: Summary = serde_json::from_str(&json).unwrap();
    assert_eq!(back, summary);
}
