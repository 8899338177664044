// 9.0: closed-system construction. a virtual cash leg absorbs every residual
// flow so the combination behaves as if funded by one upfront investment,
// and the aggregate table collapses to a single opening row. construction is
// all-or-nothing: validation failure produces no object, and there is no way
// to reopen a closed portfolio.

use crate::analytics::{AnalyticsError, FlowStats};
use crate::cashflow::CashFlowTable;
use crate::position::{CashLegFactory, Position, SourceError};
use crate::portfolio::Portfolio;
use crate::price_series::CashAsset;
use crate::report::{MetricError, Summary};
use crate::status::TradeSeries;
use crate::types::Cash;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClosedError {
    #[error("total investment must be positive, got {got}")]
    NonPositiveInvestment { got: Cash },

    #[error("cannot close a system with no cash flows")]
    EmptyFlowHistory,

    #[error("no cash-asset price at or before {date}")]
    MissingPrice { date: NaiveDate },

    #[error("initial investment too low: peak exposure {required} exceeds {available}")]
    InsufficientCapital { required: Cash, available: Cash },

    #[error(transparent)]
    Source(#[from] SourceError),
}

// 9.1: the synthesizer. derives the cash-leg trade quantity per merged date.
//
// quantity semantics follow the status convention: positive = purchase in
// currency, negative = redemption in asset units. hence the asymmetry below:
// a net outflow converts to units via the as-of price (the leg redeems units
// to fund it), while a net inflow is credited to the leg as raw currency.
// the original system behaves exactly this way; see DESIGN.md.
pub fn synthesize_cash_leg(
    total_investment: Cash,
    merged: &CashFlowTable,
    asset: &CashAsset,
) -> Result<TradeSeries, ClosedError> {
    let first = merged.first().ok_or(ClosedError::EmptyFlowHistory)?;

    let mut rows: Vec<(NaiveDate, Decimal)> = Vec::with_capacity(merged.len());
    // the leg opens with whatever the first date's net flow left of the endowment
    rows.push((first.date, total_investment.add(first.amount).value()));

    for ev in merged.iter().skip(1) {
        let delta = ev.amount;
        let quantity = if delta.is_negative() {
            let price = asset
                .prices
                .as_of(ev.date)
                .ok_or(ClosedError::MissingPrice { date: ev.date })?;
            asset.rounding.apply(delta.value() / price.value())
        } else {
            delta.value()
        };
        rows.push((ev.date, quantity));
    }

    Ok(TradeSeries::new(rows))
}

// 9.2: builder. assemble the full position set, synthesize, validate, then
// produce one immutable ClosedPortfolio. replaces after-the-fact mutation.
#[derive(Clone)]
pub struct ClosedPortfolioBuilder {
    positions: Vec<Arc<dyn Position>>,
    total_investment: Cash,
    cash_asset: CashAsset,
}

impl ClosedPortfolioBuilder {
    pub fn new(total_investment: Cash, cash_asset: CashAsset) -> Self {
        Self {
            positions: Vec::new(),
            total_investment,
            cash_asset,
        }
    }

    pub fn position(mut self, position: Arc<dyn Position>) -> Self {
        self.positions.push(position);
        self
    }

    pub fn positions(mut self, positions: impl IntoIterator<Item = Arc<dyn Position>>) -> Self {
        self.positions.extend(positions);
        self
    }

    // 9.3: two-phase protocol: raw merge → synthesize → validate → collapse.
    pub fn build(
        self,
        factory: &dyn CashLegFactory,
        stats: &dyn FlowStats,
    ) -> Result<ClosedPortfolio, ClosedError> {
        if self.total_investment.value() <= Decimal::ZERO {
            return Err(ClosedError::NonPositiveInvestment {
                got: self.total_investment,
            });
        }

        let merged = CashFlowTable::merge(self.positions.iter().map(|p| p.cash_flow_table()));
        let first_date = merged.first().ok_or(ClosedError::EmptyFlowHistory)?.date;
        let trades = synthesize_cash_leg(self.total_investment, &merged, &self.cash_asset)?;
        let cash_leg = factory.from_trades(&self.cash_asset, &trades)?;

        // the endowment must cover the deepest capital ever deployed
        let peak = stats.peak_exposure(&merged);
        if peak > self.total_investment {
            return Err(ClosedError::InsufficientCapital {
                required: peak,
                available: self.total_investment,
            });
        }

        let mut positions = self.positions;
        positions.push(cash_leg);

        Ok(ClosedPortfolio {
            inner: Portfolio::from_closed_parts(
                positions,
                CashFlowTable::from_events([(first_date, self.total_investment.negate())]),
            ),
            total_investment: self.total_investment,
        })
    }
}

// 9.4: a portfolio constrained to exactly one external cash injection.
// everything reports through the closed view; the raw merged table is gone.
#[derive(Debug, Clone)]
pub struct ClosedPortfolio {
    inner: Portfolio,
    total_investment: Cash,
}

impl ClosedPortfolio {
    pub fn total_investment(&self) -> Cash {
        self.total_investment
    }

    pub fn positions(&self) -> &[Arc<dyn Position>] {
        self.inner.positions()
    }

    /// The collapsed aggregate table: one row, `-total_investment` at the
    /// first flow date.
    pub fn cash_flow_table(&self) -> &CashFlowTable {
        self.inner.cash_flow_table()
    }

    pub fn tot(&self, metric: &str, date: NaiveDate) -> Result<Decimal, MetricError> {
        self.inner.tot(metric, date)
    }

    pub fn combsummary(&self, date: NaiveDate, stats: &dyn FlowStats) -> Summary {
        self.inner.combsummary(date, stats)
    }

    pub fn xirr_rate(
        &self,
        date: NaiveDate,
        guess: Decimal,
        stats: &dyn FlowStats,
    ) -> Result<Decimal, AnalyticsError> {
        self.inner.xirr_rate(date, guess, stats)
    }

    // 9.5: net value per invested unit. the whole combination read as a
    // single fund.
    pub fn unit_value(&self, date: NaiveDate) -> Decimal {
        let value: Cash = self
            .positions()
            .iter()
            .map(|p| p.current_value(date))
            .sum();
        value.value() / self.total_investment.value()
    }
}
