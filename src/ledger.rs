// 10.0: ledger-backed positions (mocked). a concrete Position built from a
// trade series against a priced asset, used by the sim binary and tests.
// real deployments plug their own fund/brokerage backends into the traits in
// position.rs.

use crate::analytics;
use crate::cashflow::CashFlowTable;
use crate::position::{CashLegFactory, Position, PositionSource, SourceError};
use crate::price_series::{CashAsset, PriceSeries};
use crate::report::DailyReport;
use crate::status::{StatusTable, TradeSeries};
use crate::types::{Cash, FundKind, Rounding};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A fund the ledger can trade: identity, kind, quotes, rounding policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundAsset {
    pub code: String,
    pub name: String,
    pub kind: FundKind,
    pub prices: PriceSeries,
    pub rounding: Rounding,
}

// one confirmed trade: share movement plus the cash it moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct LedgerEntry {
    date: NaiveDate,
    share_delta: Decimal,
    cash: Cash,
}

#[derive(Debug, Clone)]
pub struct LedgerPosition {
    name: String,
    code: String,
    prices: PriceSeries,
    entries: Vec<LedgerEntry>,
    table: CashFlowTable,
}

impl LedgerPosition {
    // 10.1: confirm a trade series into ledger entries. positive quantity
    // buys `rounding(qty / price)` shares for qty currency; negative quantity
    // redeems |qty| shares at the as-of price.
    pub fn from_trades(
        code: impl Into<String>,
        name: impl Into<String>,
        prices: PriceSeries,
        rounding: Rounding,
        trades: &TradeSeries,
    ) -> Result<Self, SourceError> {
        let code = code.into();
        let mut entries = Vec::with_capacity(trades.rows.len());
        for &(date, qty) in &trades.rows {
            if qty.is_zero() {
                continue;
            }
            let price = prices
                .as_of(date)
                .ok_or_else(|| SourceError::NoPriceHistory { code: code.clone() })?;
            let entry = if qty > Decimal::ZERO {
                LedgerEntry {
                    date,
                    share_delta: rounding.apply(qty / price.value()),
                    cash: Cash::new(-qty),
                }
            } else {
                LedgerEntry {
                    date,
                    share_delta: qty,
                    cash: Cash::new(-qty * price.value()),
                }
            };
            entries.push(entry);
        }

        let table = CashFlowTable::from_events(entries.iter().map(|e| (e.date, e.cash)));
        Ok(Self {
            name: name.into(),
            code,
            prices,
            entries,
            table,
        })
    }

    fn shares_as_of(&self, date: NaiveDate) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.date <= date)
            .map(|e| e.share_delta)
            .sum()
    }
}

impl Position for LedgerPosition {
    fn name(&self) -> &str {
        &self.name
    }

    fn code(&self) -> &str {
        &self.code
    }

    fn cash_flow_table(&self) -> &CashFlowTable {
        &self.table
    }

    fn current_value(&self, date: NaiveDate) -> Cash {
        let shares = self.shares_as_of(date);
        match self.prices.as_of(date) {
            Some(nv) if !shares.is_zero() => Cash::new(shares * nv.value()),
            _ => Cash::zero(),
        }
    }

    // 10.2: the 13-column row. systemic columns come from this position's own
    // table cut at `date`.
    fn daily_report(&self, date: NaiveDate) -> DailyReport {
        let cut = self.table.truncated(date);
        let shares = self.shares_as_of(date);
        let current_value = self.current_value(date);
        let total_purchase = cut.total_in();
        let redemptions = cut.total_out();
        let holding_cost = total_purchase.sub(redemptions);
        let total_profit = current_value.sub(holding_cost);
        let peak_exposure = analytics::peak_exposure(&cut);
        let turnover_rate = analytics::turnover_rate(&cut, date);
        let profit_rate = if peak_exposure.is_zero() {
            Decimal::ZERO
        } else {
            (total_profit.value() / peak_exposure.value() * dec!(100)).round_dp(4)
        };

        DailyReport {
            name: self.name.clone(),
            code: self.code.clone(),
            unit_net_value: self.prices.as_of(date).map(|nv| nv.value()),
            unit_cost: if shares.is_zero() {
                None
            } else {
                Some((holding_cost.value() / shares).round_dp(4))
            },
            shares_held: Some(shares),
            current_value,
            total_purchase,
            peak_exposure,
            holding_cost,
            redemptions,
            turnover_rate,
            total_profit,
            profit_rate,
        }
    }
}

// 10.3: registry of fund assets implementing the construction seams.
#[derive(Debug, Clone, Default)]
pub struct LedgerSource {
    assets: Vec<FundAsset>,
}

impl LedgerSource {
    pub fn new(assets: Vec<FundAsset>) -> Self {
        Self { assets }
    }

    pub fn register(&mut self, asset: FundAsset) {
        self.assets.push(asset);
    }

    fn asset(&self, code: &str) -> Option<&FundAsset> {
        self.assets.iter().find(|a| a.code == code)
    }
}

impl PositionSource for LedgerSource {
    // money-market codes are registered as such; anything unknown is guessed
    // regular, which is exactly the guess the retry protocol exists to fix
    fn classify(&self, code: &str) -> FundKind {
        self.asset(code)
            .map(|a| a.kind)
            .unwrap_or(FundKind::RegularFund)
    }

    fn build(
        &self,
        code: &str,
        kind: FundKind,
        status: &StatusTable,
    ) -> Result<Arc<dyn Position>, SourceError> {
        let asset = self.asset(code).ok_or_else(|| SourceError::NoPriceHistory {
            code: code.to_string(),
        })?;
        if asset.kind != kind {
            return Err(SourceError::KindMismatch {
                code: code.to_string(),
                tried: kind,
            });
        }
        let trades = status
            .series_for(code)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SourceError::NoTrades {
                code: code.to_string(),
            })?;
        let position = LedgerPosition::from_trades(
            asset.code.clone(),
            asset.name.clone(),
            asset.prices.clone(),
            asset.rounding,
            &trades,
        )?;
        Ok(Arc::new(position))
    }
}

impl CashLegFactory for LedgerSource {
    fn from_trades(
        &self,
        asset: &CashAsset,
        trades: &TradeSeries,
    ) -> Result<Arc<dyn Position>, SourceError> {
        let position = LedgerPosition::from_trades(
            asset.code.clone(),
            asset.name.clone(),
            asset.prices.clone(),
            asset.rounding,
            trades,
        )?;
        Ok(Arc::new(position))
    }
}
