//! Collections desk — records money against installments, keeps the
//! parent payment's status in step, and logs reminders. Status only ever
//! changes through these explicit calls; nothing here runs on a schedule.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use tour_core::error::{TourError, TourResult};
use tour_core::types::{Installment, InstallmentStatus, Payment, PaymentStatus, ReminderEntry};
use tour_ledger::LedgerStore;

/// A partial update to an installment. Amount, installment number, and
/// schedule length are deliberately absent; no transition may touch them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallmentPatch {
    pub status: Option<InstallmentStatus>,
    pub payment_date: Option<NaiveDate>,
    /// Explicitly drop a recorded payment date. Without this flag a
    /// status change never clears one.
    pub clear_payment_date: bool,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    /// Optimistic concurrency check: reject the write unless the stored
    /// row still carries this version.
    pub expected_version: Option<u64>,
}

/// A partial update to an unsplit payment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentPatch {
    pub status: Option<PaymentStatus>,
    pub payment_date: Option<NaiveDate>,
    pub clear_payment_date: bool,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

/// Installment state machine over the ledger store.
pub struct CollectionsDesk {
    store: Arc<LedgerStore>,
}

impl CollectionsDesk {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// Apply a patch to an installment. Marking an installment paid stamps
    /// today's date unless the patch supplies one. The parent payment's
    /// status is recomputed inside the same locked write.
    pub fn update_installment(
        &self,
        tenant_id: Uuid,
        installment_id: Uuid,
        patch: InstallmentPatch,
    ) -> TourResult<Installment> {
        self.update_installment_at(tenant_id, installment_id, patch, Utc::now().date_naive())
    }

    /// Same as [`update_installment`](Self::update_installment) with an
    /// explicit "today" for the paid-date default.
    pub fn update_installment_at(
        &self,
        tenant_id: Uuid,
        installment_id: Uuid,
        patch: InstallmentPatch,
        today: NaiveDate,
    ) -> TourResult<Installment> {
        let updated = self
            .store
            .update_installment_with(tenant_id, installment_id, |inst| {
                if let Some(expected) = patch.expected_version {
                    if expected != inst.version {
                        return Err(TourError::Conflict(format!(
                            "installment {installment_id} is at version {}, expected {expected}",
                            inst.version
                        )));
                    }
                }

                if let Some(method) = patch.payment_method {
                    inst.payment_method = Some(method);
                }
                if let Some(notes) = patch.notes {
                    inst.notes = Some(notes);
                }
                if patch.clear_payment_date {
                    inst.payment_date = None;
                }
                if let Some(date) = patch.payment_date {
                    inst.payment_date = Some(date);
                }
                if let Some(status) = patch.status {
                    inst.status = status;
                    if status == InstallmentStatus::Paid && inst.payment_date.is_none() {
                        inst.payment_date = Some(today);
                    }
                }
                Ok(())
            })?;

        info!(
            tenant_id = %tenant_id,
            installment_id = %installment_id,
            status = ?updated.status,
            version = updated.version,
            "Installment updated"
        );
        Ok(updated)
    }

    /// Record a collected installment: status paid, date and method noted.
    pub fn record_payment(
        &self,
        tenant_id: Uuid,
        installment_id: Uuid,
        paid_on: Option<NaiveDate>,
        payment_method: Option<String>,
    ) -> TourResult<Installment> {
        self.update_installment(
            tenant_id,
            installment_id,
            InstallmentPatch {
                status: Some(InstallmentStatus::Paid),
                payment_date: paid_on,
                payment_method,
                ..InstallmentPatch::default()
            },
        )
    }

    /// Append a reminder to the installment's structured reminder log.
    pub fn record_reminder(
        &self,
        tenant_id: Uuid,
        installment_id: Uuid,
        message: impl Into<String>,
    ) -> TourResult<Installment> {
        let entry = ReminderEntry {
            recorded_at: Utc::now(),
            message: message.into(),
        };
        let updated = self
            .store
            .update_installment_with(tenant_id, installment_id, |inst| {
                inst.reminders.push(entry);
                Ok(())
            })?;
        info!(
            tenant_id = %tenant_id,
            installment_id = %installment_id,
            reminders = updated.reminders.len(),
            "Reminder recorded"
        );
        Ok(updated)
    }

    /// Apply a patch to a payment that has not been split. Once
    /// installments exist the payment's status is derived from them and
    /// direct edits are rejected.
    pub fn update_payment(
        &self,
        tenant_id: Uuid,
        payment_id: Uuid,
        patch: PaymentPatch,
    ) -> TourResult<Payment> {
        self.update_payment_at(tenant_id, payment_id, patch, Utc::now().date_naive())
    }

    pub fn update_payment_at(
        &self,
        tenant_id: Uuid,
        payment_id: Uuid,
        patch: PaymentPatch,
        today: NaiveDate,
    ) -> TourResult<Payment> {
        let updated = self
            .store
            .update_payment_with(tenant_id, payment_id, |payment, installments| {
                if !installments.is_empty() {
                    return Err(TourError::Validation(format!(
                        "payment {payment_id} is split; its status follows its installments"
                    )));
                }

                if let Some(method) = patch.payment_method {
                    payment.payment_method = Some(method);
                }
                if let Some(notes) = patch.notes {
                    payment.notes = Some(notes);
                }
                if patch.clear_payment_date {
                    payment.payment_date = None;
                }
                if let Some(date) = patch.payment_date {
                    payment.payment_date = Some(date);
                }
                if let Some(status) = patch.status {
                    payment.status = status;
                    if status == PaymentStatus::Paid && payment.payment_date.is_none() {
                        payment.payment_date = Some(today);
                    }
                }
                Ok(())
            })?;

        info!(
            tenant_id = %tenant_id,
            payment_id = %payment_id,
            status = ?updated.status,
            "Payment updated"
        );
        Ok(updated)
    }
}
