// 6.0: the position seam. a position owns its own cash-flow table and knows
// how to value and report itself; the core only reads through these traits.
// any fund/backtest/brokerage backend can implement them.

use crate::cashflow::CashFlowTable;
use crate::price_series::CashAsset;
use crate::report::DailyReport;
use crate::status::{StatusTable, TradeSeries};
use crate::types::{Cash, FundKind};
use chrono::NaiveDate;
use std::sync::Arc;

pub trait Position {
    fn name(&self) -> &str;
    fn code(&self) -> &str;

    /// The position's own cash-flow table. The core never mutates it.
    fn cash_flow_table(&self) -> &CashFlowTable;

    /// Point-in-time market value of the holding as of `date`.
    fn current_value(&self, date: NaiveDate) -> Cash;

    /// Full 13-column report row as of `date`.
    fn daily_report(&self, date: NaiveDate) -> DailyReport;
}

// 6.1: automatic per-code construction from a status table. classification is
// an explicit step evaluated before building; a wrong guess surfaces as
// KindMismatch and the portfolio constructor retries once with the alternate.
pub trait PositionSource {
    fn classify(&self, code: &str) -> FundKind;

    fn build(
        &self,
        code: &str,
        kind: FundKind,
        status: &StatusTable,
    ) -> Result<Arc<dyn Position>, SourceError>;
}

// 6.2: turns a synthesized trade series into the virtual cash Position.
// building the position's own cash-flow table from the series is the
// collaborator's job, not the core's.
pub trait CashLegFactory {
    fn from_trades(
        &self,
        asset: &CashAsset,
        trades: &TradeSeries,
    ) -> Result<Arc<dyn Position>, SourceError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    #[error("fund kind mismatch for {code}: built as {tried:?}")]
    KindMismatch { code: String, tried: FundKind },

    #[error("no trades recorded for {code}")]
    NoTrades { code: String },

    #[error("no price history for {code}")]
    NoPriceHistory { code: String },
}
