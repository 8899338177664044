//! Fund Combination Core Simulation.
//!
//! Walks the full aggregation lifecycle: merging position ledgers, portfolio
//! summaries, and closing the system around a single upfront investment.

use chrono::NaiveDate;
use folio_core::*;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn main() {
    println!("Fund Combination Core Simulation");
    println!("Merged Ledgers, Closed-System Cash Accounting\n");

    scenario_1_merge();
    scenario_2_summary();
    scenario_3_closed_system();
    scenario_4_insufficient_capital();

    println!("\nAll simulations completed successfully.");
}

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn growth_prices() -> PriceSeries {
    PriceSeries::from_points(vec![
        point("2020-03-02", dec!(1.00)),
        point("2020-03-16", dec!(1.06)),
        point("2020-04-01", dec!(1.12)),
        point("2020-05-04", dec!(1.21)),
    ])
}

fn cash_prices() -> PriceSeries {
    PriceSeries::from_points(vec![
        point("2020-03-02", dec!(1.000)),
        point("2020-04-01", dec!(1.002)),
        point("2020-05-04", dec!(1.004)),
    ])
}

fn point(date: &str, nv: rust_decimal::Decimal) -> PricePoint {
    PricePoint {
        date: d(date),
        net_value: NetValue::new_unchecked(nv),
    }
}

fn demo_positions() -> Vec<Arc<dyn Position>> {
    let growth = LedgerPosition::from_trades(
        "000001",
        "demo growth",
        growth_prices(),
        Rounding::HalfUp,
        &TradeSeries::new(vec![
            (d("2020-03-02"), dec!(2000)),
            (d("2020-04-01"), dec!(-500)),
        ]),
    )
    .unwrap();

    let steady = LedgerPosition::from_trades(
        "000198",
        "demo steady",
        cash_prices(),
        Rounding::HalfUp,
        &TradeSeries::new(vec![
            (d("2020-03-02"), dec!(1000)),
            (d("2020-04-01"), dec!(500)),
        ]),
    )
    .unwrap();

    vec![Arc::new(growth), Arc::new(steady)]
}

/// Merging two independent position ledgers into one timeline.
fn scenario_1_merge() {
    println!("Scenario 1: Ledger Merge\n");

    let portfolio = Portfolio::from_positions(demo_positions());
    let table = portfolio.cash_flow_table();

    println!("  {} positions merged into {} dated flows", portfolio.positions().len(), table.len());
    for ev in table.iter() {
        println!("    {}  {:>10}", ev.date, ev.amount);
    }
    println!("  Net flow: {}\n", table.total());
}

/// Portfolio summary with the synthesized total row.
fn scenario_2_summary() {
    println!("Scenario 2: Combination Summary\n");

    let portfolio = Portfolio::from_positions(demo_positions());
    let stats = StandardFlowStats;
    let as_of = d("2020-05-04");

    let summary = portfolio.combsummary(as_of, &stats);
    for row in &summary.rows {
        println!(
            "  {:<12} value {:>10}  purchases {:>9}  profit {:>9}  rate {:>8}%",
            row.name, row.current_value, row.total_purchase, row.total_profit, row.profit_rate
        );
    }

    let current = portfolio.tot("currentvalue", as_of).unwrap();
    println!("\n  tot(currentvalue) = {}", current);
    println!("  xirr = {:?}\n", portfolio.xirr_rate(as_of, dec!(0.1), &stats));
}

/// Closing the system around a single upfront investment.
fn scenario_3_closed_system() {
    println!("Scenario 3: Closed System\n");

    let source = LedgerSource::default();
    let asset = CashAsset::new("mf0000", "virtual cash", cash_prices());

    let closed = ClosedPortfolioBuilder::new(Cash::new(dec!(10000)), asset)
        .positions(demo_positions())
        .build(&source, &StandardFlowStats)
        .unwrap();

    let table = closed.cash_flow_table();
    println!("  Positions including cash leg: {}", closed.positions().len());
    println!("  Aggregate table rows: {}", table.len());
    let opening = table.first().unwrap();
    println!("  Opening flow: {} on {}", opening.amount, opening.date);
    println!("  Unit value on 2020-05-04: {}\n", closed.unit_value(d("2020-05-04")));
}

/// Validation: the endowment must cover peak capital usage.
fn scenario_4_insufficient_capital() {
    println!("Scenario 4: Insufficient Capital\n");

    let source = LedgerSource::default();
    let asset = CashAsset::new("mf0000", "virtual cash", cash_prices());

    // peak exposure of the demo ledgers is 3000; 2000 cannot close the system
    let result = ClosedPortfolioBuilder::new(Cash::new(dec!(2000)), asset)
        .positions(demo_positions())
        .build(&source, &StandardFlowStats);

    match result {
        Err(ClosedError::InsufficientCapital { required, available }) => {
            println!("  Rejected as expected: needs {}, offered {}\n", required, available);
        }
        other => panic!("expected InsufficientCapital, got {other:?}"),
    }
}
