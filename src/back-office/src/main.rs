//! Tour Office — travel-agency back office for payment plans, collections,
//! and receivables reporting.
//!
//! Seeds an in-memory ledger with demo data and prints the delinquency
//! report and period dashboard for it.

mod demo;

use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

use tour_core::config::AppConfig;
use tour_core::types::OrderStatus;
use tour_ledger::LedgerStore;
use tour_receivables::{CollectionsDesk, PaymentPlanner};
use tour_reporting::{DelinquencyMonitor, PeriodDashboard, PeriodSelector, QuickRange};

#[derive(Parser, Debug)]
#[command(name = "tour-office")]
#[command(about = "Travel-agency back office: payment plans and receivables reporting")]
#[command(version)]
struct Cli {
    /// Agency name (overrides config)
    #[arg(long, env = "TOUR_OFFICE__AGENCY_NAME")]
    agency_name: Option<String>,

    /// Reporting quick range: today|week|month|year|7days|30days|90days|all
    #[arg(long, default_value = "30days")]
    range: String,

    /// Skip demo seeding (prints empty reports)
    #[arg(long, default_value_t = false)]
    no_seed: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tour_office=info,tour_ledger=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Tour Office starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(name) = cli.agency_name {
        config.agency_name = name;
    }

    let range = QuickRange::parse(&cli.range)
        .ok_or_else(|| anyhow::anyhow!("unknown quick range: {}", cli.range))?;

    info!(
        agency = %config.agency_name,
        currency = %config.currency.code,
        range = %cli.range,
        "Configuration loaded"
    );

    // Wire the engines over one shared ledger.
    let store = Arc::new(LedgerStore::new());
    let planner = PaymentPlanner::with_scale(store.clone(), config.currency.scale);
    let desk = CollectionsDesk::new(store.clone());
    let monitor = DelinquencyMonitor::new(store.clone());
    let dashboard = PeriodDashboard::with_week_start(store.clone(), config.reporting.week_start());

    let tenant = if cli.no_seed {
        uuid::Uuid::new_v4()
    } else {
        demo::seed(&store, &planner, &desk, &config)?
    };

    let report = monitor.report(tenant);
    info!(
        overdue = report.stats.total_overdue_count,
        customers_affected = report.stats.total_customers_affected,
        "Delinquency report generated"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    let stats = dashboard.stats(tenant, PeriodSelector::quick(range), &OrderStatus::ALL);
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
