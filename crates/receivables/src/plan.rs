//! Payment plan builder — creates the single payment obligation for an
//! order and, on request, splits it into a monthly installment schedule.

use chrono::{Months, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use tour_core::error::{TourError, TourResult};
use tour_core::types::{Installment, InstallmentStatus, Payment, PaymentStatus};
use tour_ledger::LedgerStore;

pub const MIN_INSTALLMENTS: u32 = 2;
pub const MAX_INSTALLMENTS: u32 = 12;

const DEFAULT_SCALE: u32 = 2;

/// Builds payment plans against the ledger store.
pub struct PaymentPlanner {
    store: Arc<LedgerStore>,
    /// Decimal places of the smallest currency unit.
    scale: u32,
}

impl PaymentPlanner {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self {
            store,
            scale: DEFAULT_SCALE,
        }
    }

    pub fn with_scale(store: Arc<LedgerStore>, scale: u32) -> Self {
        Self { store, scale }
    }

    /// Create the payment obligation for an order that is missing one.
    /// Orders normally get their payment at booking time; this is the
    /// repair path for chains flagged by `find_orders_without_payment`.
    pub fn create_payment(&self, tenant_id: Uuid, order_id: Uuid) -> TourResult<Payment> {
        let order = self.store.get_order(tenant_id, order_id)?;
        if order.total_amount <= Decimal::ZERO {
            return Err(TourError::Validation(format!(
                "order total must be positive, got {}",
                order.total_amount
            )));
        }

        let payment = Payment {
            id: Uuid::new_v4(),
            tenant_id,
            order_id,
            amount: order.total_amount,
            due_date: order.travel_date,
            status: PaymentStatus::Pending,
            payment_date: None,
            payment_method: None,
            notes: None,
            created_at: Utc::now(),
        };
        let payment = self.store.insert_payment(payment)?;
        info!(
            tenant_id = %tenant_id,
            order_id = %order_id,
            payment_id = %payment.id,
            amount = %payment.amount,
            "Payment obligation created"
        );
        Ok(payment)
    }

    /// Split a payment into `count` near-equal monthly installments.
    ///
    /// The first installment shares the payment's due date; each subsequent
    /// one falls due a calendar month later, clamped to the target month's
    /// last day when needed. Amounts are equal at currency scale except the
    /// last, which absorbs the rounding remainder so the schedule sums to
    /// the payment amount exactly. A payment can be split at most once.
    pub fn split_into_installments(
        &self,
        tenant_id: Uuid,
        payment_id: Uuid,
        count: u32,
    ) -> TourResult<Vec<Installment>> {
        if !(MIN_INSTALLMENTS..=MAX_INSTALLMENTS).contains(&count) {
            return Err(TourError::Validation(format!(
                "installment count must be between {MIN_INSTALLMENTS} and {MAX_INSTALLMENTS}, got {count}"
            )));
        }

        let payment = self.store.get_payment(tenant_id, payment_id)?;
        let amounts = equal_amounts(payment.amount, count, self.scale)?;

        let now = Utc::now();
        let mut rows = Vec::with_capacity(count as usize);
        for (idx, amount) in amounts.into_iter().enumerate() {
            let due_date = payment
                .due_date
                .checked_add_months(Months::new(idx as u32))
                .ok_or_else(|| {
                    TourError::Validation(format!(
                        "cannot shift {} forward by {idx} months",
                        payment.due_date
                    ))
                })?;
            rows.push(Installment {
                id: Uuid::new_v4(),
                tenant_id,
                payment_id,
                installment_number: idx as u32 + 1,
                total_installments: count,
                amount,
                due_date,
                status: InstallmentStatus::Pending,
                payment_date: None,
                payment_method: None,
                notes: None,
                reminders: Vec::new(),
                version: 0,
                created_at: now,
            });
        }

        let rows = self
            .store
            .insert_installment_batch(tenant_id, payment_id, rows)?;
        info!(
            tenant_id = %tenant_id,
            payment_id = %payment_id,
            count,
            "Payment split into installments"
        );
        Ok(rows)
    }
}

/// Divide `total` into `count` parts rounded at `scale`, the last part
/// absorbing the remainder so the parts sum back to `total` exactly.
fn equal_amounts(total: Decimal, count: u32, scale: u32) -> TourResult<Vec<Decimal>> {
    let base = (total / Decimal::from(count)).round_dp(scale);
    let last = total - base * Decimal::from(count - 1);

    let mut amounts = vec![base; count as usize - 1];
    amounts.push(last);

    if amounts.iter().any(|a| *a <= Decimal::ZERO) {
        return Err(TourError::Validation(format!(
            "amount {total} cannot be split into {count} positive installments"
        )));
    }
    Ok(amounts)
}
