use chrono::Weekday;
use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `TOUR_OFFICE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_agency_name")]
    pub agency_name: String,
    #[serde(default)]
    pub currency: CurrencyConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyConfig {
    #[serde(default = "default_currency_code")]
    pub code: String,
    /// Decimal places of the smallest currency unit (2 for USD/EUR).
    #[serde(default = "default_currency_scale")]
    pub scale: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportingConfig {
    /// First day of the `week` quick range: "sunday" or "monday".
    #[serde(default = "default_week_starts_on")]
    pub week_starts_on: String,
}

impl ReportingConfig {
    pub fn week_start(&self) -> Weekday {
        match self.week_starts_on.to_ascii_lowercase().as_str() {
            "monday" => Weekday::Mon,
            _ => Weekday::Sun,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    #[serde(default = "default_demo_customers")]
    pub customers: usize,
    #[serde(default = "default_demo_orders")]
    pub orders: usize,
}

// Default functions
fn default_agency_name() -> String {
    "tour-office".to_string()
}
fn default_currency_code() -> String {
    "USD".to_string()
}
fn default_currency_scale() -> u32 {
    2
}
fn default_week_starts_on() -> String {
    "sunday".to_string()
}
fn default_demo_customers() -> usize {
    6
}
fn default_demo_orders() -> usize {
    12
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            code: default_currency_code(),
            scale: default_currency_scale(),
        }
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            week_starts_on: default_week_starts_on(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            customers: default_demo_customers(),
            orders: default_demo_orders(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agency_name: default_agency_name(),
            currency: CurrencyConfig::default(),
            reporting: ReportingConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("TOUR_OFFICE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
