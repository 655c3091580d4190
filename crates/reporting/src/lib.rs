//! Read-side analytics over the ledger: delinquency aging and period
//! revenue dashboards. Both are recomputed in full on every call; nothing
//! here is cached or persisted.

pub mod delinquency;
pub mod period;

pub use delinquency::{DelinquencyMonitor, DelinquencyReport, DelinquencyStats, RiskLevel};
pub use period::{PeriodDashboard, PeriodSelector, PeriodStats, QuickRange};
