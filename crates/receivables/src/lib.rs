//! Receivables engines: turning an order's total into scheduled payment
//! obligations and tracking their collection over time.

pub mod collections;
pub mod plan;

pub use collections::{CollectionsDesk, InstallmentPatch, PaymentPatch};
pub use plan::PaymentPlanner;
