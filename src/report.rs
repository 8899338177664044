// 4.0: daily report rows and the summary table. 13 fixed columns per row;
// the synthesized total row leaves unit-level columns empty because they have
// no portfolio-level meaning.

use crate::types::Cash;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const TOTAL_NAME: &str = "total";
pub const TOTAL_CODE: &str = "total";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReport {
    pub name: String,
    pub code: String,
    pub unit_net_value: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    pub shares_held: Option<Decimal>,
    pub current_value: Cash,
    pub total_purchase: Cash,
    pub peak_exposure: Cash,
    pub holding_cost: Cash,
    pub redemptions: Cash,
    pub turnover_rate: Decimal,
    pub total_profit: Cash,
    pub profit_rate: Decimal,
}

impl DailyReport {
    pub fn is_total_row(&self) -> bool {
        self.code == TOTAL_CODE
    }
}

// 4.1: the value-bearing summary columns. `name` and `code` are not metrics,
// so parsing them fails the same way an unknown string does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    UnitNetValue,
    UnitCost,
    SharesHeld,
    CurrentValue,
    TotalPurchase,
    PeakExposure,
    HoldingCost,
    Redemptions,
    TurnoverRate,
    TotalProfit,
    ProfitRate,
}

impl Metric {
    // column cell for one report row. unit-level columns read zero on the
    // total row, where they are reported as missing.
    pub fn value_of(&self, report: &DailyReport) -> Decimal {
        match self {
            Metric::UnitNetValue => report.unit_net_value.unwrap_or_default(),
            Metric::UnitCost => report.unit_cost.unwrap_or_default(),
            Metric::SharesHeld => report.shares_held.unwrap_or_default(),
            Metric::CurrentValue => report.current_value.value(),
            Metric::TotalPurchase => report.total_purchase.value(),
            Metric::PeakExposure => report.peak_exposure.value(),
            Metric::HoldingCost => report.holding_cost.value(),
            Metric::Redemptions => report.redemptions.value(),
            Metric::TurnoverRate => report.turnover_rate,
            Metric::TotalProfit => report.total_profit.value(),
            Metric::ProfitRate => report.profit_rate,
        }
    }
}

impl FromStr for Metric {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unitnetvalue" => Ok(Metric::UnitNetValue),
            "unitcost" => Ok(Metric::UnitCost),
            "sharesheld" => Ok(Metric::SharesHeld),
            "currentvalue" => Ok(Metric::CurrentValue),
            "totalpurchase" => Ok(Metric::TotalPurchase),
            "peakexposure" => Ok(Metric::PeakExposure),
            "holdingcost" => Ok(Metric::HoldingCost),
            "redemptions" => Ok(Metric::Redemptions),
            "turnoverrate" => Ok(Metric::TurnoverRate),
            "totalprofit" => Ok(Metric::TotalProfit),
            "profitrate" => Ok(Metric::ProfitRate),
            other => Err(MetricError::Unknown {
                name: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricError {
    #[error("unknown report metric: {name}")]
    Unknown { name: String },
}

// 4.2: combsummary output. per-position rows plus one total row, sorted
// descending by current value (the total row participates in the sort).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub rows: Vec<DailyReport>,
}

impl Summary {
    pub fn total_row(&self) -> Option<&DailyReport> {
        self.rows.iter().find(|r| r.is_total_row())
    }

    pub fn position_rows(&self) -> impl Iterator<Item = &DailyReport> {
        self.rows.iter().filter(|r| !r.is_total_row())
    }
}
