//! The ledger store. One DashMap table per entity, every access scoped by
//! tenant id. The parent payment's entry guard doubles as the write lock
//! for its installment chain, so a split and a status update on the same
//! payment serialize instead of interleaving.

use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

use tour_core::error::{TourError, TourResult};
use tour_core::types::{
    Customer, Installment, InstallmentStatus, Order, OrderStatus, Payment, PaymentStatus,
    TravelPackage,
};

/// In-memory ledger backed by `DashMap`.
pub struct LedgerStore {
    customers: DashMap<Uuid, Customer>,
    packages: DashMap<Uuid, TravelPackage>,
    orders: DashMap<Uuid, Order>,
    payments: DashMap<Uuid, Payment>,
    installments: DashMap<Uuid, Installment>,
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            customers: DashMap::new(),
            packages: DashMap::new(),
            orders: DashMap::new(),
            payments: DashMap::new(),
            installments: DashMap::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Customers and packages
    // -----------------------------------------------------------------------

    /// Insert a customer row.
    pub fn insert_customer(&self, customer: Customer) -> TourResult<Customer> {
        if self.customers.contains_key(&customer.id) {
            return Err(TourError::Persistence(format!(
                "duplicate customer id {}",
                customer.id
            )));
        }
        self.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    /// Insert a catalog package row. Prices must be positive.
    pub fn insert_package(&self, package: TravelPackage) -> TourResult<TravelPackage> {
        if package.price <= Decimal::ZERO {
            return Err(TourError::Validation(format!(
                "package price must be positive, got {}",
                package.price
            )));
        }
        if self.packages.contains_key(&package.id) {
            return Err(TourError::Persistence(format!(
                "duplicate package id {}",
                package.id
            )));
        }
        self.packages.insert(package.id, package.clone());
        Ok(package)
    }

    pub fn get_customer(&self, tenant_id: Uuid, id: Uuid) -> TourResult<Customer> {
        self.customers
            .get(&id)
            .filter(|c| c.tenant_id == tenant_id)
            .map(|c| c.clone())
            .ok_or_else(|| TourError::not_found("customer", id))
    }

    pub fn get_package(&self, tenant_id: Uuid, id: Uuid) -> TourResult<TravelPackage> {
        self.packages
            .get(&id)
            .filter(|p| p.tenant_id == tenant_id)
            .map(|p| p.clone())
            .ok_or_else(|| TourError::not_found("package", id))
    }

    pub fn list_customers(&self, tenant_id: Uuid) -> Vec<Customer> {
        self.customers
            .iter()
            .filter(|e| e.value().tenant_id == tenant_id)
            .map(|e| e.value().clone())
            .collect()
    }

    pub fn list_packages(&self, tenant_id: Uuid) -> Vec<TravelPackage> {
        self.packages
            .iter()
            .filter(|e| e.value().tenant_id == tenant_id)
            .map(|e| e.value().clone())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    /// Book an order and its payment obligation in one call. The total is
    /// fixed here as package price times traveler count; the payment falls
    /// due on the travel date.
    pub fn create_order(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
        package_id: Uuid,
        number_of_travelers: u32,
        travel_date: chrono::NaiveDate,
    ) -> TourResult<(Order, Payment)> {
        self.get_customer(tenant_id, customer_id)?;
        let package = self.get_package(tenant_id, package_id)?;

        if number_of_travelers == 0 {
            return Err(TourError::Validation(
                "an order needs at least one traveler".into(),
            ));
        }
        let total_amount = package.price * Decimal::from(number_of_travelers);
        if total_amount <= Decimal::ZERO {
            return Err(TourError::Validation(format!(
                "order total must be positive, got {total_amount}"
            )));
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            tenant_id,
            customer_id,
            package_id,
            total_amount,
            travel_date,
            status: OrderStatus::Pending,
            number_of_travelers,
            created_at: now,
        };
        let payment = Payment {
            id: Uuid::new_v4(),
            tenant_id,
            order_id: order.id,
            amount: total_amount,
            due_date: travel_date,
            status: PaymentStatus::Pending,
            payment_date: None,
            payment_method: None,
            notes: None,
            created_at: now,
        };

        self.orders.insert(order.id, order.clone());
        self.payments.insert(payment.id, payment.clone());

        info!(
            tenant_id = %tenant_id,
            order_id = %order.id,
            payment_id = %payment.id,
            amount = %total_amount,
            "Order booked with payment obligation"
        );
        Ok((order, payment))
    }

    /// Insert a pre-built order row. Used by tests and seeding to backdate
    /// `created_at`; referential and tenant checks still apply.
    pub fn insert_order(&self, order: Order) -> TourResult<Order> {
        self.get_customer(order.tenant_id, order.customer_id)?;
        self.get_package(order.tenant_id, order.package_id)?;
        if self.orders.contains_key(&order.id) {
            return Err(TourError::Persistence(format!(
                "duplicate order id {}",
                order.id
            )));
        }
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    pub fn get_order(&self, tenant_id: Uuid, id: Uuid) -> TourResult<Order> {
        self.orders
            .get(&id)
            .filter(|o| o.tenant_id == tenant_id)
            .map(|o| o.clone())
            .ok_or_else(|| TourError::not_found("order", id))
    }

    pub fn list_orders(&self, tenant_id: Uuid) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|e| e.value().tenant_id == tenant_id)
            .map(|e| e.value().clone())
            .collect()
    }

    pub fn update_order_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: OrderStatus,
    ) -> TourResult<Order> {
        let mut entry = self
            .orders
            .get_mut(&id)
            .filter(|o| o.tenant_id == tenant_id)
            .ok_or_else(|| TourError::not_found("order", id))?;
        entry.status = status;
        info!(tenant_id = %tenant_id, order_id = %id, status = ?status, "Order status updated");
        Ok(entry.clone())
    }

    /// Delete an order together with its payment and installments.
    pub fn delete_order(&self, tenant_id: Uuid, id: Uuid) -> TourResult<()> {
        self.get_order(tenant_id, id)?;

        let payment_id = self
            .payments
            .iter()
            .find(|e| e.value().order_id == id)
            .map(|e| *e.key());

        // Children first so no reader ever joins an installment to a
        // deleted payment.
        if let Some(pid) = payment_id {
            self.installments.retain(|_, i| i.payment_id != pid);
            self.payments.remove(&pid);
        }
        self.orders.remove(&id);

        info!(tenant_id = %tenant_id, order_id = %id, "Order deleted with payment chain");
        Ok(())
    }

    /// Orders missing their 1:1 payment. A failed payment insert after an
    /// order write leaves exactly this inconsistency; operators query it
    /// instead of discovering it through a crash.
    pub fn find_orders_without_payment(&self, tenant_id: Uuid) -> Vec<Order> {
        let covered: HashSet<Uuid> = self
            .payments
            .iter()
            .filter(|e| e.value().tenant_id == tenant_id)
            .map(|e| e.value().order_id)
            .collect();
        self.orders
            .iter()
            .filter(|e| e.value().tenant_id == tenant_id && !covered.contains(&e.value().id))
            .map(|e| e.value().clone())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Payments
    // -----------------------------------------------------------------------

    /// Insert a payment row for an existing order. Rejects a second payment
    /// for the same order.
    pub fn insert_payment(&self, payment: Payment) -> TourResult<Payment> {
        self.get_order(payment.tenant_id, payment.order_id)?;
        if self
            .payments
            .iter()
            .any(|e| e.value().order_id == payment.order_id)
        {
            return Err(TourError::Validation(format!(
                "order {} already has a payment",
                payment.order_id
            )));
        }
        self.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    pub fn get_payment(&self, tenant_id: Uuid, id: Uuid) -> TourResult<Payment> {
        self.payments
            .get(&id)
            .filter(|p| p.tenant_id == tenant_id)
            .map(|p| p.clone())
            .ok_or_else(|| TourError::not_found("payment", id))
    }

    pub fn payment_for_order(&self, tenant_id: Uuid, order_id: Uuid) -> TourResult<Payment> {
        self.payments
            .iter()
            .find(|e| e.value().tenant_id == tenant_id && e.value().order_id == order_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| TourError::NotFound(format!("payment for order {order_id}")))
    }

    pub fn list_payments(&self, tenant_id: Uuid) -> Vec<Payment> {
        self.payments
            .iter()
            .filter(|e| e.value().tenant_id == tenant_id)
            .map(|e| e.value().clone())
            .collect()
    }

    /// Mutate a payment under its entry guard. The closure receives the
    /// payment and its current installments; direct payment edits are only
    /// legal while the installment list is empty, which the closure is
    /// expected to enforce.
    pub fn update_payment_with<F>(&self, tenant_id: Uuid, id: Uuid, f: F) -> TourResult<Payment>
    where
        F: FnOnce(&mut Payment, &[Installment]) -> TourResult<()>,
    {
        let mut entry = self
            .payments
            .get_mut(&id)
            .filter(|p| p.tenant_id == tenant_id)
            .ok_or_else(|| TourError::not_found("payment", id))?;
        let siblings = self.installments_of(id);
        f(&mut entry, &siblings)?;
        Ok(entry.clone())
    }

    // -----------------------------------------------------------------------
    // Installments
    // -----------------------------------------------------------------------

    /// Persist a freshly computed installment schedule. All rows land or
    /// none do: the batch is only inserted after every row has been built
    /// and validated, while the parent payment's entry guard is held. A
    /// concurrent split blocks on the guard and then fails `AlreadySplit`.
    pub fn insert_installment_batch(
        &self,
        tenant_id: Uuid,
        payment_id: Uuid,
        rows: Vec<Installment>,
    ) -> TourResult<Vec<Installment>> {
        let _guard = self
            .payments
            .get_mut(&payment_id)
            .filter(|p| p.tenant_id == tenant_id)
            .ok_or_else(|| TourError::not_found("payment", payment_id))?;

        if self
            .installments
            .iter()
            .any(|e| e.value().payment_id == payment_id)
        {
            return Err(TourError::AlreadySplit(payment_id));
        }
        if rows.is_empty() {
            return Err(TourError::Validation("empty installment batch".into()));
        }
        for row in &rows {
            if row.payment_id != payment_id || row.tenant_id != tenant_id {
                return Err(TourError::Persistence(format!(
                    "installment {} does not belong to payment {payment_id}",
                    row.id
                )));
            }
        }

        for row in &rows {
            self.installments.insert(row.id, row.clone());
        }
        info!(
            tenant_id = %tenant_id,
            payment_id = %payment_id,
            count = rows.len(),
            "Installment schedule persisted"
        );
        Ok(rows)
    }

    pub fn get_installment(&self, tenant_id: Uuid, id: Uuid) -> TourResult<Installment> {
        self.installments
            .get(&id)
            .filter(|i| i.tenant_id == tenant_id)
            .map(|i| i.clone())
            .ok_or_else(|| TourError::not_found("installment", id))
    }

    /// All installments of a payment, ordered by installment number.
    pub fn installments_for_payment(
        &self,
        tenant_id: Uuid,
        payment_id: Uuid,
    ) -> TourResult<Vec<Installment>> {
        self.get_payment(tenant_id, payment_id)?;
        Ok(self.installments_of(payment_id))
    }

    pub fn list_installments(&self, tenant_id: Uuid) -> Vec<Installment> {
        self.installments
            .iter()
            .filter(|e| e.value().tenant_id == tenant_id)
            .map(|e| e.value().clone())
            .collect()
    }

    fn installments_of(&self, payment_id: Uuid) -> Vec<Installment> {
        let mut rows: Vec<Installment> = self
            .installments
            .iter()
            .filter(|e| e.value().payment_id == payment_id)
            .map(|e| e.value().clone())
            .collect();
        rows.sort_by_key(|i| i.installment_number);
        rows
    }

    /// Mutate an installment and recompute its parent payment's status in
    /// the same locked write. The payment guard is taken first, so two
    /// updates on the same chain serialize and the recompute always sees
    /// the final row states.
    pub fn update_installment_with<F>(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        f: F,
    ) -> TourResult<Installment>
    where
        F: FnOnce(&mut Installment) -> TourResult<()>,
    {
        let payment_id = self
            .installments
            .get(&id)
            .filter(|i| i.tenant_id == tenant_id)
            .map(|i| i.payment_id)
            .ok_or_else(|| TourError::not_found("installment", id))?;

        let mut payment = self.payments.get_mut(&payment_id).ok_or_else(|| {
            TourError::Persistence(format!("payment {payment_id} missing for installment {id}"))
        })?;

        let updated = {
            // Re-check under the payment guard; the row may have been
            // cascaded away between the lookup and the lock.
            let mut entry = self
                .installments
                .get_mut(&id)
                .filter(|i| i.tenant_id == tenant_id)
                .ok_or_else(|| TourError::not_found("installment", id))?;
            f(&mut entry)?;
            entry.version += 1;
            entry.clone()
        };

        let siblings = self.installments_of(payment_id);
        let derived = derived_payment_status(&siblings, payment.status);
        if derived != payment.status {
            info!(
                payment_id = %payment_id,
                from = ?payment.status,
                to = ?derived,
                "Payment status recomputed from installments"
            );
        }
        payment.status = derived;
        if derived == PaymentStatus::Paid {
            payment.payment_date = siblings.iter().filter_map(|i| i.payment_date).max();
        }

        Ok(updated)
    }
}

/// Collection status of a payment as implied by its installments: settled
/// when every installment is paid, partial as soon as one is, otherwise
/// whatever open label the payment already carried (a manual `overdue`
/// marking survives until money moves).
pub fn derived_payment_status(
    installments: &[Installment],
    current: PaymentStatus,
) -> PaymentStatus {
    if installments.is_empty() {
        return current;
    }
    let paid = installments
        .iter()
        .filter(|i| i.status == InstallmentStatus::Paid)
        .count();
    if paid == installments.len() {
        PaymentStatus::Paid
    } else if paid > 0 {
        PaymentStatus::Partial
    } else if current == PaymentStatus::Overdue {
        PaymentStatus::Overdue
    } else {
        PaymentStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn seed_catalog(store: &LedgerStore, tenant: Uuid) -> (Customer, TravelPackage) {
        let customer = store
            .insert_customer(Customer {
                id: Uuid::new_v4(),
                tenant_id: tenant,
                name: "Ada Lovelace".into(),
                email: Some("ada@example.com".into()),
                phone: None,
                created_at: Utc::now(),
            })
            .unwrap();
        let package = store
            .insert_package(TravelPackage {
                id: Uuid::new_v4(),
                tenant_id: tenant,
                name: "Lisbon Getaway".into(),
                destination: "Lisbon".into(),
                price: dec!(500.00),
                duration_days: 5,
                created_at: Utc::now(),
            })
            .unwrap();
        (customer, package)
    }

    #[test]
    fn test_create_order_books_payment_atomically() {
        let store = LedgerStore::new();
        let tenant = Uuid::new_v4();
        let (customer, package) = seed_catalog(&store, tenant);

        let travel = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let (order, payment) = store
            .create_order(tenant, customer.id, package.id, 3, travel)
            .unwrap();

        assert_eq!(order.total_amount, dec!(1500.00));
        assert_eq!(payment.amount, order.total_amount);
        assert_eq!(payment.due_date, travel);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(store.find_orders_without_payment(tenant).is_empty());
    }

    #[test]
    fn test_zero_travelers_rejected() {
        let store = LedgerStore::new();
        let tenant = Uuid::new_v4();
        let (customer, package) = seed_catalog(&store, tenant);

        let travel = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let err = store
            .create_order(tenant, customer.id, package.id, 0, travel)
            .unwrap_err();
        assert!(matches!(err, TourError::Validation(_)));
    }

    #[test]
    fn test_tenant_isolation_reads_as_not_found() {
        let store = LedgerStore::new();
        let tenant = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let (customer, package) = seed_catalog(&store, tenant);

        let travel = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let (order, payment) = store
            .create_order(tenant, customer.id, package.id, 1, travel)
            .unwrap();

        assert!(matches!(
            store.get_order(intruder, order.id),
            Err(TourError::NotFound(_))
        ));
        assert!(matches!(
            store.get_payment(intruder, payment.id),
            Err(TourError::NotFound(_))
        ));
        // The same id resolves fine for the owning tenant.
        assert!(store.get_order(tenant, order.id).is_ok());
    }

    #[test]
    fn test_second_payment_for_order_rejected() {
        let store = LedgerStore::new();
        let tenant = Uuid::new_v4();
        let (customer, package) = seed_catalog(&store, tenant);

        let travel = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let (order, payment) = store
            .create_order(tenant, customer.id, package.id, 1, travel)
            .unwrap();

        let duplicate = Payment {
            id: Uuid::new_v4(),
            order_id: order.id,
            ..payment
        };
        assert!(matches!(
            store.insert_payment(duplicate),
            Err(TourError::Validation(_))
        ));
    }

    #[test]
    fn test_delete_order_cascades() {
        let store = LedgerStore::new();
        let tenant = Uuid::new_v4();
        let (customer, package) = seed_catalog(&store, tenant);

        let travel = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let (order, payment) = store
            .create_order(tenant, customer.id, package.id, 2, travel)
            .unwrap();

        let rows: Vec<Installment> = (1..=2u32)
            .map(|n| Installment {
                id: Uuid::new_v4(),
                tenant_id: tenant,
                payment_id: payment.id,
                installment_number: n,
                total_installments: 2,
                amount: dec!(500.00),
                due_date: travel,
                status: InstallmentStatus::Pending,
                payment_date: None,
                payment_method: None,
                notes: None,
                reminders: Vec::new(),
                version: 0,
                created_at: Utc::now(),
            })
            .collect();
        store
            .insert_installment_batch(tenant, payment.id, rows)
            .unwrap();

        store.delete_order(tenant, order.id).unwrap();

        assert!(store.get_order(tenant, order.id).is_err());
        assert!(store.get_payment(tenant, payment.id).is_err());
        assert!(store.list_installments(tenant).is_empty());
    }

    #[test]
    fn test_derived_payment_status() {
        let tenant = Uuid::new_v4();
        let payment_id = Uuid::new_v4();
        let mk = |n: u32, status: InstallmentStatus| Installment {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            payment_id,
            installment_number: n,
            total_installments: 3,
            amount: dec!(100.00),
            due_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            status,
            payment_date: None,
            payment_method: None,
            notes: None,
            reminders: Vec::new(),
            version: 0,
            created_at: Utc::now(),
        };

        let none_paid = vec![
            mk(1, InstallmentStatus::Pending),
            mk(2, InstallmentStatus::Pending),
        ];
        assert_eq!(
            derived_payment_status(&none_paid, PaymentStatus::Pending),
            PaymentStatus::Pending
        );
        // A manual overdue marking survives while nothing is collected.
        assert_eq!(
            derived_payment_status(&none_paid, PaymentStatus::Overdue),
            PaymentStatus::Overdue
        );

        let one_paid = vec![
            mk(1, InstallmentStatus::Paid),
            mk(2, InstallmentStatus::Pending),
        ];
        assert_eq!(
            derived_payment_status(&one_paid, PaymentStatus::Overdue),
            PaymentStatus::Partial
        );

        let all_paid = vec![mk(1, InstallmentStatus::Paid), mk(2, InstallmentStatus::Paid)];
        assert_eq!(
            derived_payment_status(&all_paid, PaymentStatus::Partial),
            PaymentStatus::Paid
        );
    }
}
