use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Statuses
// ---------------------------------------------------------------------------

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Confirmed and completed orders count as converted revenue.
    pub fn is_converted(self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::Completed)
    }
}

/// Collection status of the payment obligation attached to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
}

/// Collection status of a single installment. There is no partial state at
/// this granularity; an installment is settled whole or not at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Overdue,
}

impl InstallmentStatus {
    /// An open installment still carries an outstanding balance. The stored
    /// `overdue` label is a manual marking; the read side derives overdue
    /// membership from the due date instead.
    pub fn is_open(self) -> bool {
        matches!(self, InstallmentStatus::Pending | InstallmentStatus::Overdue)
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A customer of the agency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A travel package in the agency catalog. `price` is per traveler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelPackage {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub destination: String,
    pub price: Decimal,
    pub duration_days: u32,
    pub created_at: DateTime<Utc>,
}

/// A booked trip. `total_amount` is fixed at creation (package price times
/// traveler count) and is not recomputed if the package price later changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub package_id: Uuid,
    pub total_amount: Decimal,
    pub travel_date: NaiveDate,
    pub status: OrderStatus,
    pub number_of_travelers: u32,
    pub created_at: DateTime<Utc>,
}

/// The single billing obligation tied 1:1 to an order. `amount` never
/// changes once installments have been generated from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub order_id: Uuid,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub status: PaymentStatus,
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One timestamped reminder recorded against an installment. Entries are
/// append-only and kept in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderEntry {
    pub recorded_at: DateTime<Utc>,
    pub message: String,
}

/// One of N sub-obligations a payment has been split into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub payment_id: Uuid,
    /// 1-based position in the schedule, unique per payment.
    pub installment_number: u32,
    /// Schedule length, fixed at split time and replicated on every row.
    pub total_installments: u32,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub status: InstallmentStatus,
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub reminders: Vec<ReminderEntry>,
    /// Optimistic concurrency counter, bumped on every mutation.
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converted_statuses() {
        assert!(OrderStatus::Confirmed.is_converted());
        assert!(OrderStatus::Completed.is_converted());
        assert!(!OrderStatus::Pending.is_converted());
        assert!(!OrderStatus::Cancelled.is_converted());
    }

    #[test]
    fn test_open_installment_statuses() {
        assert!(InstallmentStatus::Pending.is_open());
        assert!(InstallmentStatus::Overdue.is_open());
        assert!(!InstallmentStatus::Paid.is_open());
    }

    #[test]
    fn test_status_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Confirmed).unwrap(),
            "\"confirmed\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Partial).unwrap(),
            "\"partial\""
        );
    }
}
