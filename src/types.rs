// 1.0: all the primitives live here. nothing in the core works without these types.
// cash amounts, unit net values, rounding policies, fund kinds. each is a newtype
// so the compiler catches type mixups.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

// 1.1: signed currency amount. negative = money leaving the investor into a
// position (purchase), positive = money coming back (redemption/dividend).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cash(Decimal);

impl Cash {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    pub fn add(&self, other: Cash) -> Self {
        Self(self.0 + other.0)
    }

    pub fn sub(&self, other: Cash) -> Self {
        Self(self.0 - other.0)
    }

    pub fn negate(&self) -> Self {
        Self(-self.0)
    }

    pub fn max(&self, other: Cash) -> Self {
        Self(self.0.max(other.0))
    }
}

impl fmt::Display for Cash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for Cash {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cash {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl Sum for Cash {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, c| acc.add(c))
    }
}

impl<'a> Sum<&'a Cash> for Cash {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, c| acc.add(*c))
    }
}

// 1.2: per-unit net value of a fund. must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetValue(Decimal);

impl NetValue {
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn new_unchecked(value: Decimal) -> Self {
        debug_assert!(value > Decimal::ZERO);
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for NetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.3: share-rounding policy. funds quote confirmed shares to 2 decimal
// places; which way the midpoint goes differs per fund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rounding {
    HalfUp,
    HalfDown,
}

impl Rounding {
    pub fn apply(&self, value: Decimal) -> Decimal {
        let strategy = match self {
            Rounding::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Rounding::HalfDown => RoundingStrategy::MidpointTowardZero,
        };
        value.round_dp_with_strategy(2, strategy)
    }
}

// 1.4: the two position kinds automatic construction can produce.
// classification is explicit: guess one, retry with the alternate on mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundKind {
    RegularFund,
    MoneyMarketFund,
}

impl FundKind {
    pub fn alternate(&self) -> Self {
        match self {
            FundKind::RegularFund => FundKind::MoneyMarketFund,
            FundKind::MoneyMarketFund => FundKind::RegularFund,
        }
    }
}
