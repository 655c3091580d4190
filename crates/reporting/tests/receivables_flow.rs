//! End-to-end flow: book an order, split its payment, collect a couple of
//! installments, and check that both read-side reports agree with what
//! the desk recorded.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

use tour_core::types::{
    Customer, InstallmentStatus, OrderStatus, PaymentStatus, TravelPackage,
};
use tour_ledger::LedgerStore;
use tour_receivables::{CollectionsDesk, InstallmentPatch, PaymentPlanner};
use tour_reporting::{DelinquencyMonitor, PeriodDashboard, PeriodSelector, QuickRange, RiskLevel};

fn reporting_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap()
}

#[test]
fn booked_split_collected_reported() {
    let store = Arc::new(LedgerStore::new());
    let planner = PaymentPlanner::new(store.clone());
    let desk = CollectionsDesk::new(store.clone());
    let monitor = DelinquencyMonitor::new(store.clone());
    let dashboard = PeriodDashboard::new(store.clone());

    let tenant = Uuid::new_v4();
    let now = reporting_instant();
    let today = now.date_naive();

    let customer = store
        .insert_customer(Customer {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            name: "Ibn Battuta".into(),
            email: Some("ibn@example.com".into()),
            phone: None,
            created_at: now - Duration::days(120),
        })
        .unwrap();
    let package = store
        .insert_package(TravelPackage {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            name: "Rihla".into(),
            destination: "Tangier to Beijing".into(),
            price: dec!(500.00),
            duration_days: 30,
            created_at: now - Duration::days(120),
        })
        .unwrap();

    // Trip booked for three months ago, so the schedule is mostly due.
    let travel_date = today - Duration::days(90);
    let (order, payment) = store
        .create_order(tenant, customer.id, package.id, 2, travel_date)
        .unwrap();
    assert_eq!(order.total_amount, dec!(1000.00));
    store
        .update_order_status(tenant, order.id, OrderStatus::Confirmed)
        .unwrap();

    let installments = planner
        .split_into_installments(tenant, payment.id, 3)
        .unwrap();
    let amounts: Vec<_> = installments.iter().map(|i| i.amount).collect();
    assert_eq!(amounts, vec![dec!(333.33), dec!(333.33), dec!(333.34)]);

    // First installment collected on time, second left open, third not
    // yet due... except the trip was 90 days ago, so it is too.
    desk.record_payment(
        tenant,
        installments[0].id,
        Some(travel_date),
        Some("bank_transfer".into()),
    )
    .unwrap();
    desk.record_reminder(tenant, installments[1].id, "sent first notice")
        .unwrap();
    desk.update_installment_at(
        tenant,
        installments[1].id,
        InstallmentPatch {
            status: Some(InstallmentStatus::Overdue),
            ..InstallmentPatch::default()
        },
        today,
    )
    .unwrap();

    // The parent payment now reflects partial collection.
    let payment = store.get_payment(tenant, payment.id).unwrap();
    assert_eq!(payment.status, PaymentStatus::Partial);

    // Delinquency report: installments 2 and 3 are past due (due dates
    // 2026-06-08 and 2026-07-08 against the 2026-08-06 instant),
    // installment 1 is settled.
    let report = monitor.report_at(tenant, now);
    assert_eq!(report.stats.total_overdue_count, 2);
    assert_eq!(report.stats.total_overdue_amount, dec!(666.67));
    assert_eq!(report.stats.total_customers_affected, 1);
    assert_eq!(report.stats.avg_days_overdue, 44);

    let oldest = &report.installments[0];
    assert_eq!(oldest.installment_number, 2);
    assert_eq!(oldest.days_overdue, 59);
    assert_eq!(oldest.risk_level, RiskLevel::High);
    assert_eq!(oldest.status, InstallmentStatus::Overdue);
    assert_eq!(oldest.reminders_sent, 1);
    assert_eq!(oldest.customer_name, "Ibn Battuta");

    let newer = &report.installments[1];
    assert_eq!(newer.installment_number, 3);
    assert_eq!(newer.days_overdue, 29);
    assert_eq!(newer.risk_level, RiskLevel::Medium);
    // Nobody marked this one; the stored label still says pending.
    assert_eq!(newer.status, InstallmentStatus::Pending);

    // Period dashboard over everything: one confirmed order, one paid
    // installment, one marked overdue.
    let stats = dashboard.stats_at(
        tenant,
        PeriodSelector::quick(QuickRange::All),
        &OrderStatus::ALL,
        now,
    );
    assert_eq!(stats.orders, 1);
    assert_eq!(stats.revenue, dec!(1000.00));
    assert_eq!(stats.confirmed_revenue, dec!(1000.00));
    assert_eq!(stats.conversion_rate, 100.0);
    assert_eq!(stats.customers, 1);
    assert_eq!(stats.received, dec!(333.33));
    assert_eq!(stats.overdue, dec!(333.33));
    // The payment left pending-land when collection started.
    assert_eq!(stats.pending, 0);

    // Deleting the order takes the whole chain with it.
    store.delete_order(tenant, order.id).unwrap();
    let after = monitor.report_at(tenant, now);
    assert_eq!(after.stats.total_overdue_count, 0);
    assert!(store.list_installments(tenant).is_empty());
}
