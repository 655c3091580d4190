//! Tenant-scoped ledger store for the travel back office: customers,
//! packages, orders, payments, and installments. Backed by DashMap for
//! development; swap to PostgreSQL for production.

pub mod store;

pub use store::LedgerStore;
