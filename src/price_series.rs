// 3.0: date-indexed net-value series and the cash-equivalent reference asset.
// lookups are "most recent value at or before date" reads, so the series must
// be sorted ascending; the constructor enforces that.

use crate::types::{NetValue, Rounding};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub net_value: NetValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn from_points(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Self { points }
    }

    // 3.1: most recent net value at or before `date`. None before the series starts.
    pub fn as_of(&self, date: NaiveDate) -> Option<NetValue> {
        let end = self.points.partition_point(|p| p.date <= date);
        if end == 0 {
            None
        } else {
            Some(self.points[end - 1].net_value)
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// 3.2: the reference cash-equivalent asset a closed system trades against.
// its rounding policy is the one applied when currency converts to units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashAsset {
    pub code: String,
    pub name: String,
    pub prices: PriceSeries,
    pub rounding: Rounding,
}

impl CashAsset {
    pub fn new(code: impl Into<String>, name: impl Into<String>, prices: PriceSeries) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            prices,
            rounding: Rounding::HalfUp,
        }
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }
}
