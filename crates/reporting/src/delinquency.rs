//! Delinquency analytics — scans open installments past their due date and
//! derives age, risk, and exposure aggregates.
//!
//! Overdue membership here is computed from the due date against the
//! reporting instant, never from the stored `overdue` label. The stored
//! status is carried through on each row so callers can see both notions
//! side by side; the two are allowed to disagree.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use tour_core::types::InstallmentStatus;
use tour_ledger::LedgerStore;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Age classification of an overdue installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Pure function of the overdue age: up to a week is low, up to a
    /// month medium, anything older high.
    pub fn classify(days_overdue: i64) -> Self {
        if days_overdue <= 7 {
            RiskLevel::Low
        } else if days_overdue <= 30 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

/// One overdue installment joined through payment and order to its
/// customer. `status` is the stored label; `days_overdue` and membership
/// in this report are derived from the due date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueInstallmentView {
    pub installment_id: Uuid,
    pub payment_id: Uuid,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub installment_number: u32,
    pub total_installments: u32,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub status: InstallmentStatus,
    pub days_overdue: i64,
    pub risk_level: RiskLevel,
    pub reminders_sent: usize,
}

/// A fixed age bucket for charting. The bucket boundaries intentionally
/// differ from the risk boundaries (both split at 30, only these split
/// again at 60); the two classifications stay separate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgingBucket {
    pub label: String,
    pub count: u64,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelinquencyStats {
    pub total_overdue_count: u64,
    pub total_overdue_amount: Decimal,
    pub total_customers_affected: u64,
    pub avg_days_overdue: i64,
    pub aging: Vec<AgingBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelinquencyReport {
    pub installments: Vec<OverdueInstallmentView>,
    pub stats: DelinquencyStats,
    pub generated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Aging buckets: lower bound, optional upper bound (inclusive), label.
const AGING_BUCKETS: [(i64, Option<i64>, &str); 4] = [
    (0, Some(7), "0-7 days"),
    (8, Some(30), "8-30 days"),
    (31, Some(60), "31-60 days"),
    (61, None, "61+ days"),
];

/// On-demand delinquency projection over the ledger store.
pub struct DelinquencyMonitor {
    store: Arc<LedgerStore>,
}

impl DelinquencyMonitor {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// Build the report against the current clock.
    pub fn report(&self, tenant_id: Uuid) -> DelinquencyReport {
        self.report_at(tenant_id, Utc::now())
    }

    /// Build the report against an explicit reporting instant. All date
    /// math in one report uses this single instant.
    ///
    /// An installment enters the overdue set the day after its due date:
    /// the filter is a strict `due_date < today`, so a row due today is
    /// not yet overdue and every included row has `days_overdue >= 1`.
    pub fn report_at(&self, tenant_id: Uuid, now: DateTime<Utc>) -> DelinquencyReport {
        let today = now.date_naive();

        let mut views = Vec::new();
        for installment in self.store.list_installments(tenant_id) {
            if !installment.status.is_open() || installment.due_date >= today {
                continue;
            }

            // Join through payment and order to the customer. A broken
            // chain means the cascade was interrupted; skip the row, this
            // is a projection, not a validator.
            let Ok(payment) = self.store.get_payment(tenant_id, installment.payment_id) else {
                warn!(installment_id = %installment.id, "installment without payment, skipped");
                continue;
            };
            let Ok(order) = self.store.get_order(tenant_id, payment.order_id) else {
                warn!(payment_id = %payment.id, "payment without order, skipped");
                continue;
            };
            let Ok(customer) = self.store.get_customer(tenant_id, order.customer_id) else {
                warn!(order_id = %order.id, "order without customer, skipped");
                continue;
            };

            let days_overdue = (today - installment.due_date).num_days();
            views.push(OverdueInstallmentView {
                installment_id: installment.id,
                payment_id: payment.id,
                order_id: order.id,
                customer_id: customer.id,
                customer_name: customer.name,
                installment_number: installment.installment_number,
                total_installments: installment.total_installments,
                amount: installment.amount,
                due_date: installment.due_date,
                status: installment.status,
                days_overdue,
                risk_level: RiskLevel::classify(days_overdue),
                reminders_sent: installment.reminders.len(),
            });
        }

        views.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));
        let stats = compute_stats(&views);

        DelinquencyReport {
            installments: views,
            stats,
            generated_at: now,
        }
    }
}

fn compute_stats(views: &[OverdueInstallmentView]) -> DelinquencyStats {
    let total_overdue_count = views.len() as u64;
    let total_overdue_amount: Decimal = views.iter().map(|v| v.amount).sum();
    let customers: HashSet<Uuid> = views.iter().map(|v| v.customer_id).collect();

    let avg_days_overdue = if views.is_empty() {
        0
    } else {
        let total_days: i64 = views.iter().map(|v| v.days_overdue).sum();
        (total_days as f64 / views.len() as f64).round() as i64
    };

    let aging = AGING_BUCKETS
        .iter()
        .map(|(min, max, label)| {
            let in_bucket = |v: &&OverdueInstallmentView| {
                v.days_overdue >= *min && max.map_or(true, |m| v.days_overdue <= m)
            };
            AgingBucket {
                label: (*label).to_string(),
                count: views.iter().filter(in_bucket).count() as u64,
                amount: views.iter().filter(in_bucket).map(|v| v.amount).sum(),
            }
        })
        .collect();

    DelinquencyStats {
        total_overdue_count,
        total_overdue_amount,
        total_customers_affected: customers.len() as u64,
        avg_days_overdue,
        aging,
    }
}
