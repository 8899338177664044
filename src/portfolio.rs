// 8.0: the portfolio. holds a shared set of positions and the one merged
// cash-flow table derived from them at construction. all reporting reads
// through that table; nothing here mutates a position.

use crate::analytics::{AnalyticsError, FlowStats};
use crate::cashflow::CashFlowTable;
use crate::position::{Position, PositionSource, SourceError};
use crate::report::{DailyReport, Metric, MetricError, Summary, TOTAL_CODE, TOTAL_NAME};
use crate::status::StatusTable;
use crate::types::Cash;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

#[derive(Clone)]
pub struct Portfolio {
    positions: Vec<Arc<dyn Position>>,
    table: CashFlowTable,
}

impl std::fmt::Debug for Portfolio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Portfolio")
            .field("positions", &self.positions.len())
            .field("table", &self.table)
            .finish()
    }
}

impl Portfolio {
    // 8.1: explicit-collection constructor. the merged table is derived once,
    // here, and never recomputed.
    pub fn from_positions(positions: Vec<Arc<dyn Position>>) -> Self {
        let table = CashFlowTable::merge(positions.iter().map(|p| p.cash_flow_table()));
        Self { positions, table }
    }

    // 8.2: per-code construction from a status table. classify first, build,
    // and on a kind mismatch retry exactly once with the alternate kind. a
    // second mismatch (or any other build failure) propagates.
    pub fn from_status(
        status: &StatusTable,
        source: &dyn PositionSource,
    ) -> Result<Self, SourceError> {
        let mut positions: Vec<Arc<dyn Position>> = Vec::with_capacity(status.codes.len());
        for code in &status.codes {
            let kind = source.classify(code);
            let position = match source.build(code, kind, status) {
                Ok(p) => p,
                Err(SourceError::KindMismatch { .. }) => {
                    source.build(code, kind.alternate(), status)?
                }
                Err(err) => return Err(err),
            };
            positions.push(position);
        }
        Ok(Self::from_positions(positions))
    }

    // closed construction swaps in the collapsed single-row table
    pub(crate) fn from_closed_parts(
        positions: Vec<Arc<dyn Position>>,
        table: CashFlowTable,
    ) -> Self {
        Self { positions, table }
    }

    pub fn positions(&self) -> &[Arc<dyn Position>] {
        &self.positions
    }

    /// The merged aggregate cash-flow table.
    pub fn cash_flow_table(&self) -> &CashFlowTable {
        &self.table
    }

    // 8.3: sum of one report column across all positions as of `date`.
    pub fn tot(&self, metric: &str, date: NaiveDate) -> Result<Decimal, MetricError> {
        let metric: Metric = metric.parse()?;
        Ok(self
            .positions
            .iter()
            .map(|p| metric.value_of(&p.daily_report(date)))
            .sum())
    }

    // 8.4: combsummary. per-position rows are independent; the total row sums
    // the summable columns but recomputes peak exposure and turnover from the
    // aggregate table cut at `date`, because those are systemic quantities.
    pub fn combsummary(&self, date: NaiveDate, stats: &dyn FlowStats) -> Summary {
        let mut rows: Vec<DailyReport> = self
            .positions
            .iter()
            .map(|p| p.daily_report(date))
            .collect();

        let current_value: Cash = rows.iter().map(|r| r.current_value).sum();
        let total_purchase: Cash = rows.iter().map(|r| r.total_purchase).sum();
        let holding_cost: Cash = rows.iter().map(|r| r.holding_cost).sum();
        let redemptions: Cash = rows.iter().map(|r| r.redemptions).sum();
        let total_profit: Cash = rows.iter().map(|r| r.total_profit).sum();

        let cut = self.table.truncated(date);
        let peak_exposure = stats.peak_exposure(&cut);
        let turnover_rate = stats.turnover_rate(&cut, date);
        let profit_rate = if peak_exposure.is_zero() {
            Decimal::ZERO
        } else {
            (total_profit.value() / peak_exposure.value() * dec!(100)).round_dp(4)
        };

        rows.push(DailyReport {
            name: TOTAL_NAME.to_string(),
            code: TOTAL_CODE.to_string(),
            unit_net_value: None,
            unit_cost: None,
            shares_held: None,
            current_value,
            total_purchase,
            peak_exposure,
            holding_cost,
            redemptions,
            turnover_rate,
            total_profit,
            profit_rate,
        });

        rows.sort_by(|a, b| b.current_value.cmp(&a.current_value));
        Summary { rows }
    }

    // 8.5: irr of the whole combination, delegated to the evaluator over the
    // aggregate table and position set.
    pub fn xirr_rate(
        &self,
        date: NaiveDate,
        guess: Decimal,
        stats: &dyn FlowStats,
    ) -> Result<Decimal, AnalyticsError> {
        stats.xirr(&self.table, &self.positions, date, guess)
    }
}
