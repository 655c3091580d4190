//! Period revenue dashboard — resolves a reporting window from a quick
//! range or explicit bounds and aggregates order, customer, and
//! collection metrics over it.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use tour_core::types::{InstallmentStatus, OrderStatus, PaymentStatus};
use tour_ledger::LedgerStore;

// ---------------------------------------------------------------------------
// Period selection
// ---------------------------------------------------------------------------

/// A named relative reporting window, resolved against "now" at
/// evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuickRange {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "year")]
    Year,
    #[serde(rename = "7days")]
    Last7Days,
    #[serde(rename = "30days")]
    Last30Days,
    #[serde(rename = "90days")]
    Last90Days,
    #[serde(rename = "all")]
    All,
}

impl QuickRange {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "today" => Some(Self::Today),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            "7days" => Some(Self::Last7Days),
            "30days" => Some(Self::Last30Days),
            "90days" => Some(Self::Last90Days),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// A quick range plus optional explicit bounds. An explicit bound wins
/// over the quick range for its own field only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PeriodSelector {
    pub quick: QuickRange,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl PeriodSelector {
    pub fn quick(quick: QuickRange) -> Self {
        Self {
            quick,
            start: None,
            end: None,
        }
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            quick: QuickRange::All,
            start: Some(start),
            end: Some(end),
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodStats {
    /// Resolved window; `start` is absent for the `all` range.
    pub start: Option<DateTime<Utc>>,
    pub end: DateTime<Utc>,
    /// Orders created in the window matching the status filter.
    pub orders: u64,
    /// Total value of matched orders, whatever their status.
    pub revenue: Decimal,
    /// Value of matched orders that are confirmed or completed.
    pub confirmed_revenue: Decimal,
    /// Share of matched orders that converted, in percent.
    pub conversion_rate: f64,
    /// Customers created in the window, independent of the order filter.
    pub customers: u64,
    /// Installment money collected in the window, keyed on payment date.
    pub received: Decimal,
    /// Total of installments currently marked overdue. A snapshot, not a
    /// period figure: deliberately not date-filtered.
    pub overdue: Decimal,
    /// Payments still pending that were created in the window.
    pub pending: u64,
    pub generated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// On-demand period dashboard over the ledger store.
pub struct PeriodDashboard {
    store: Arc<LedgerStore>,
    week_start: Weekday,
}

impl PeriodDashboard {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self {
            store,
            week_start: Weekday::Sun,
        }
    }

    pub fn with_week_start(store: Arc<LedgerStore>, week_start: Weekday) -> Self {
        Self { store, week_start }
    }

    /// Aggregate stats for the window against the current clock.
    pub fn stats(
        &self,
        tenant_id: Uuid,
        selector: PeriodSelector,
        statuses: &[OrderStatus],
    ) -> PeriodStats {
        self.stats_at(tenant_id, selector, statuses, Utc::now())
    }

    /// Aggregate stats against an explicit "now". One instant drives the
    /// whole computation so window resolution and filtering agree.
    pub fn stats_at(
        &self,
        tenant_id: Uuid,
        selector: PeriodSelector,
        statuses: &[OrderStatus],
        now: DateTime<Utc>,
    ) -> PeriodStats {
        let (start, end) = self.resolve(selector, now);

        let in_window = |t: DateTime<Utc>| start.map_or(true, |s| t >= s) && t <= end;
        let date_in_window = |d: NaiveDate| {
            start.map_or(true, |s| d >= s.date_naive()) && d <= end.date_naive()
        };

        let matched: Vec<_> = self
            .store
            .list_orders(tenant_id)
            .into_iter()
            .filter(|o| in_window(o.created_at) && statuses.contains(&o.status))
            .collect();

        let orders = matched.len() as u64;
        let revenue: Decimal = matched.iter().map(|o| o.total_amount).sum();
        let converted = matched.iter().filter(|o| o.status.is_converted());
        let confirmed_revenue: Decimal = converted.clone().map(|o| o.total_amount).sum();
        let conversion_rate = if matched.is_empty() {
            0.0
        } else {
            converted.count() as f64 / matched.len() as f64 * 100.0
        };

        let customers = self
            .store
            .list_customers(tenant_id)
            .iter()
            .filter(|c| in_window(c.created_at))
            .count() as u64;

        let installments = self.store.list_installments(tenant_id);
        let received: Decimal = installments
            .iter()
            .filter(|i| i.status == InstallmentStatus::Paid)
            .filter(|i| i.payment_date.is_some_and(date_in_window))
            .map(|i| i.amount)
            .sum();
        let overdue: Decimal = installments
            .iter()
            .filter(|i| i.status == InstallmentStatus::Overdue)
            .map(|i| i.amount)
            .sum();

        let pending = self
            .store
            .list_payments(tenant_id)
            .iter()
            .filter(|p| p.status == PaymentStatus::Pending && in_window(p.created_at))
            .count() as u64;

        PeriodStats {
            start,
            end,
            orders,
            revenue,
            confirmed_revenue,
            conversion_rate,
            customers,
            received,
            overdue,
            pending,
            generated_at: now,
        }
    }

    /// Resolve a selector to concrete bounds. Explicit bounds override the
    /// quick range per field; `all` has no lower bound.
    fn resolve(
        &self,
        selector: PeriodSelector,
        now: DateTime<Utc>,
    ) -> (Option<DateTime<Utc>>, DateTime<Utc>) {
        let end = selector.end.unwrap_or(now);
        let start = selector
            .start
            .or_else(|| self.quick_start(selector.quick, now));
        (start, end)
    }

    fn quick_start(&self, quick: QuickRange, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let today = now.date_naive();
        let date = match quick {
            QuickRange::Today => today,
            QuickRange::Week => {
                let back = match self.week_start {
                    Weekday::Mon => today.weekday().num_days_from_monday(),
                    _ => today.weekday().num_days_from_sunday(),
                };
                today - Duration::days(back as i64)
            }
            QuickRange::Month => today.with_day(1).expect("first of month is valid"),
            QuickRange::Year => {
                NaiveDate::from_ymd_opt(today.year(), 1, 1).expect("january 1st is valid")
            }
            QuickRange::Last7Days => today - Duration::days(7),
            QuickRange::Last30Days => today - Duration::days(30),
            QuickRange::Last90Days => today - Duration::days(90),
            QuickRange::All => return None,
        };
        Some(midnight(date))
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .expect("midnight is valid")
        .and_utc()
}
