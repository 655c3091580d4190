//! Demo seeding for the in-memory ledger: a handful of customers and
//! packages, a spread of orders at different ages, and enough collection
//! activity to make both reports interesting.

use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use tour_core::config::AppConfig;
use tour_core::types::{Customer, InstallmentStatus, OrderStatus, TravelPackage};
use tour_ledger::LedgerStore;
use tour_receivables::{CollectionsDesk, InstallmentPatch, PaymentPlanner};

const DESTINATIONS: [(&str, &str, i64, u32); 5] = [
    ("Lisbon Getaway", "Lisbon", 45000, 5),
    ("Kyoto Autumn", "Kyoto", 120000, 10),
    ("Patagonia Trek", "El Chaltén", 180000, 14),
    ("Nile Classic", "Cairo", 95000, 8),
    ("Dolomites Loop", "Cortina", 75000, 7),
];

const NAMES: [&str; 8] = [
    "Ada Mendes",
    "Bruno Costa",
    "Carla Sequeira",
    "Diego Ortega",
    "Edith Msafiri",
    "Farid Khan",
    "Greta Lindqvist",
    "Hugo Tanaka",
];

/// Seed one demo tenant and return its id.
pub fn seed(
    store: &Arc<LedgerStore>,
    planner: &PaymentPlanner,
    desk: &CollectionsDesk,
    config: &AppConfig,
) -> anyhow::Result<Uuid> {
    let mut rng = rand::thread_rng();
    let tenant = Uuid::new_v4();
    let now = Utc::now();
    let today = now.date_naive();

    let customers: Vec<Customer> = NAMES
        .iter()
        .take(config.demo.customers)
        .enumerate()
        .map(|(idx, name)| {
            store.insert_customer(Customer {
                id: Uuid::new_v4(),
                tenant_id: tenant,
                name: (*name).to_string(),
                email: Some(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
                phone: None,
                created_at: now - Duration::days(idx as i64 * 11),
            })
        })
        .collect::<Result<_, _>>()?;

    let packages: Vec<TravelPackage> = DESTINATIONS
        .iter()
        .map(|(name, destination, cents, days)| {
            store.insert_package(TravelPackage {
                id: Uuid::new_v4(),
                tenant_id: tenant,
                name: (*name).to_string(),
                destination: (*destination).to_string(),
                price: rust_decimal::Decimal::new(*cents, config.currency.scale),
                duration_days: *days,
                created_at: now - Duration::days(200),
            })
        })
        .collect::<Result<_, _>>()?;

    for n in 0..config.demo.orders {
        let customer = customers.choose(&mut rng).expect("customers seeded");
        let package = packages.choose(&mut rng).expect("packages seeded");
        // Travel dates from three months back to three months out, so
        // part of the book is already delinquent.
        let travel_date = today + Duration::days(rng.gen_range(-90..90));
        let travelers = rng.gen_range(1..=4);

        let (order, payment) =
            store.create_order(tenant, customer.id, package.id, travelers, travel_date)?;

        let status = match n % 4 {
            0 => OrderStatus::Pending,
            3 => OrderStatus::Cancelled,
            _ => OrderStatus::Confirmed,
        };
        if status != OrderStatus::Pending {
            store.update_order_status(tenant, order.id, status)?;
        }

        // Two thirds of the book is on an installment plan.
        if n % 3 != 0 {
            let count = rng.gen_range(2..=6);
            let installments = planner.split_into_installments(tenant, payment.id, count)?;

            for installment in &installments {
                if installment.due_date >= today {
                    continue;
                }
                let age = (today - installment.due_date).num_days();
                // Older obligations are likelier to have been collected.
                if rng.gen_range(0..100) < 55 + age.min(40) {
                    desk.record_payment(
                        tenant,
                        installment.id,
                        Some(installment.due_date + Duration::days(rng.gen_range(0..5))),
                        Some("bank_transfer".into()),
                    )?;
                } else if age > 14 {
                    desk.record_reminder(tenant, installment.id, "payment reminder sent")?;
                    desk.update_installment(
                        tenant,
                        installment.id,
                        InstallmentPatch {
                            status: Some(InstallmentStatus::Overdue),
                            ..InstallmentPatch::default()
                        },
                    )?;
                }
            }
        }
    }

    info!(
        tenant_id = %tenant,
        customers = customers.len(),
        packages = packages.len(),
        orders = config.demo.orders,
        "Demo ledger seeded"
    );
    Ok(tenant)
}
