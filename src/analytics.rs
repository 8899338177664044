// 7.0: flow analytics. peak exposure ("bottleneck"), turnover rate, and the
// irr of a dated flow series are systemic quantities of a whole table, not
// sums of per-position values. the core consumes them through the FlowStats
// trait; StandardFlowStats is the shipped reference implementation, the same
// way the engine's oracle/custody collaborators ship as mocks.

use crate::cashflow::CashFlowTable;
use crate::position::Position;
use crate::types::Cash;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

pub trait FlowStats {
    /// Maximum cumulative capital ever deployed over the table.
    fn peak_exposure(&self, table: &CashFlowTable) -> Cash;

    /// Trading activity relative to capital base, annualized, over
    /// `[first event, as_of]`.
    fn turnover_rate(&self, table: &CashFlowTable, as_of: NaiveDate) -> Decimal;

    /// Internal rate of return of the flow series plus a terminal inflow
    /// equal to the positions' combined value at `as_of`.
    fn xirr(
        &self,
        table: &CashFlowTable,
        positions: &[Arc<dyn Position>],
        as_of: NaiveDate,
        guess: Decimal,
    ) -> Result<Decimal, AnalyticsError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalyticsError {
    #[error("irr: no flows at or before {as_of}")]
    EmptyTable { as_of: NaiveDate },

    #[error("irr did not converge")]
    NoConvergence,
}

// 7.1: peak exposure = max over prefixes of -(running sum), floored at zero.
// a system that only ever receives money has zero exposure.
pub fn peak_exposure(table: &CashFlowTable) -> Cash {
    let mut running = Cash::zero();
    let mut peak = Cash::zero();
    for ev in table.iter() {
        running = running.add(ev.amount);
        peak = peak.max(running.negate());
    }
    peak
}

// 7.2: turnover = half the gross flow volume over the capital base,
// annualized by the span from the first event to `as_of`. zero whenever the
// base or the span is degenerate.
pub fn turnover_rate(table: &CashFlowTable, as_of: NaiveDate) -> Decimal {
    let cut = table.truncated(as_of);
    let first = match cut.first() {
        Some(ev) => ev.date,
        None => return Decimal::ZERO,
    };
    let span_days = (as_of - first).num_days();
    if span_days <= 0 {
        return Decimal::ZERO;
    }
    let peak = peak_exposure(&cut);
    if peak.is_zero() {
        return Decimal::ZERO;
    }
    let gross = cut.total_in().add(cut.total_out());
    gross.value() / dec!(2) / peak.value() * dec!(365) / Decimal::from(span_days)
}

// 7.3: irr of the truncated table with one terminal event: the combined
// current value of all positions flowing back at `as_of`. newton from the
// caller's guess, bisection fallback.
pub fn xirr(
    table: &CashFlowTable,
    positions: &[Arc<dyn Position>],
    as_of: NaiveDate,
    guess: Decimal,
) -> Result<Decimal, AnalyticsError> {
    let cut = table.truncated(as_of);
    let first = cut
        .first()
        .ok_or(AnalyticsError::EmptyTable { as_of })?
        .date;

    let mut flows: Vec<(f64, f64)> = cut
        .iter()
        .map(|ev| (year_fraction(first, ev.date), decimal_to_f64(ev.amount.value())))
        .collect();
    let terminal: Cash = positions.iter().map(|p| p.current_value(as_of)).sum();
    flows.push((year_fraction(first, as_of), decimal_to_f64(terminal.value())));

    let has_out = flows.iter().any(|(_, v)| *v < 0.0);
    let has_in = flows.iter().any(|(_, v)| *v > 0.0);
    if !has_out || !has_in {
        return Err(AnalyticsError::NoConvergence);
    }

    let npv = |rate: f64| -> f64 {
        flows
            .iter()
            .map(|(t, v)| v / (1.0 + rate).powf(*t))
            .sum()
    };

    // newton first
    let mut rate = decimal_to_f64(guess);
    for _ in 0..100 {
        let f = npv(rate);
        if f.abs() < 1e-9 {
            return f64_to_decimal(rate);
        }
        let h = 1e-7;
        let df = (npv(rate + h) - f) / h;
        if df.abs() < 1e-12 {
            break;
        }
        let next = rate - f / df;
        if !next.is_finite() || next <= -1.0 {
            break;
        }
        if (next - rate).abs() < 1e-10 {
            return f64_to_decimal(next);
        }
        rate = next;
    }

    // bisection fallback over a wide bracket
    let (mut lo, mut hi) = (-0.9999, 10.0);
    let (mut f_lo, f_hi) = (npv(lo), npv(hi));
    if f_lo * f_hi > 0.0 {
        return Err(AnalyticsError::NoConvergence);
    }
    for _ in 0..200 {
        let mid = (lo + hi) / 2.0;
        let f_mid = npv(mid);
        if f_mid.abs() < 1e-9 || (hi - lo) < 1e-10 {
            return f64_to_decimal(mid);
        }
        if f_lo * f_mid <= 0.0 {
            hi = mid;
        } else {
            lo = mid;
            f_lo = f_mid;
        }
    }
    f64_to_decimal((lo + hi) / 2.0)
}

fn year_fraction(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64 / 365.0
}

fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

fn f64_to_decimal(value: f64) -> Result<Decimal, AnalyticsError> {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp(8))
        .ok_or(AnalyticsError::NoConvergence)
}

/// Reference evaluator wiring the free functions into the trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFlowStats;

impl FlowStats for StandardFlowStats {
    fn peak_exposure(&self, table: &CashFlowTable) -> Cash {
        peak_exposure(table)
    }

    fn turnover_rate(&self, table: &CashFlowTable, as_of: NaiveDate) -> Decimal {
        turnover_rate(table, as_of)
    }

    fn xirr(
        &self,
        table: &CashFlowTable,
        positions: &[Arc<dyn Position>],
        as_of: NaiveDate,
        guess: Decimal,
    ) -> Result<Decimal, AnalyticsError> {
        xirr(table, positions, as_of, guess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn table(rows: &[(&str, Decimal)]) -> CashFlowTable {
        CashFlowTable::from_events(rows.iter().map(|(s, v)| (d(s), Cash::new(*v))))
    }

    #[test]
    fn peak_exposure_tracks_deepest_drawdown() {
        let t = table(&[
            ("2020-03-01", dec!(-100)),
            ("2020-03-05", dec!(-50)),
            ("2020-03-09", dec!(30)),
            ("2020-03-12", dec!(-10)),
        ]);
        // running: -100, -150, -120, -130 → deepest -150
        assert_eq!(peak_exposure(&t).value(), dec!(150));
    }

    #[test]
    fn peak_exposure_of_pure_inflows_is_zero() {
        let t = table(&[("2020-03-01", dec!(40)), ("2020-03-05", dec!(10))]);
        assert_eq!(peak_exposure(&t).value(), dec!(0));
    }

    #[test]
    fn turnover_zero_on_degenerate_spans() {
        let t = table(&[("2020-03-01", dec!(-100))]);
        assert_eq!(turnover_rate(&t, d("2020-03-01")), dec!(0));
        assert_eq!(turnover_rate(&CashFlowTable::empty(), d("2020-03-01")), dec!(0));
    }

    #[test]
    fn turnover_annualizes_gross_volume() {
        let t = table(&[("2020-03-01", dec!(-100)), ("2020-03-11", dec!(50))]);
        // gross 150, peak 100, span 10 days as of 03-11
        let rate = turnover_rate(&t, d("2020-03-11"));
        assert_eq!(rate, dec!(150) / dec!(2) / dec!(100) * dec!(365) / dec!(10));
    }

    #[test]
    fn xirr_without_both_signs_fails() {
        let t = table(&[("2020-03-01", dec!(-100))]);
        let err = xirr(&t, &[], d("2020-03-31"), dec!(0.1)).unwrap_err();
        assert!(matches!(err, AnalyticsError::NoConvergence));
    }

    #[test]
    fn xirr_recovers_known_rate() {
        // -100 now, +110 one year later, no residual holdings → 10%
        let t = table(&[("2020-03-01", dec!(-100)), ("2021-03-01", dec!(110))]);
        let rate = xirr(&t, &[], d("2021-03-01"), dec!(0.1)).unwrap();
        let diff = (rate - dec!(0.1)).abs();
        assert!(diff < dec!(0.0001), "rate = {rate}");
    }
}
