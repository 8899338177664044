// folio-core: fund combination analytics engine.
// cash-accounting first: merged flow tables and closed-system invariants take priority.
// all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: Cash, NetValue, Rounding, FundKind
//   2.x  cashflow.rs: cash-flow tables and the grouped-sum merge
//   3.x  price_series.rs: as-of net-value lookups, cash-equivalent asset
//   4.x  report.rs: 13-column daily reports, summary metrics
//   5.x  status.rs: status ledgers and trade series
//   6.x  position.rs: Position trait and construction seams
//   7.x  analytics.rs: peak exposure, turnover, irr (reference impl)
//   8.x  portfolio.rs: portfolio aggregation: tot, combsummary, xirr
//   9.x  closed.rs: closed-system synthesis and validation
//   10.x ledger.rs: ledger-backed positions (mocked)

// core accounting modules
pub mod cashflow;
pub mod closed;
pub mod portfolio;
pub mod price_series;
pub mod report;
pub mod status;
pub mod types;

// collaborator seams
pub mod analytics;
pub mod ledger;
pub mod position;

// re exports for convenience
pub use analytics::*;
pub use cashflow::*;
pub use closed::*;
pub use portfolio::*;
pub use position::*;
pub use price_series::*;
pub use report::*;
pub use status::*;
pub use types::*;
pub use ledger::{FundAsset, LedgerPosition, LedgerSource};
