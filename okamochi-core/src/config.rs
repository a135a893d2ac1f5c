use rust_decimal::Decimal;

/// Marketplace configuration
///
/// # Environment variables
///
/// Every value can be overridden through the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | SERVICE_FEE_RATE | 0.15 | Customer service fee, fraction of subtotal |
/// | TAX_RATE | 0.10 | Consumption tax, fraction of pre-tax total |
/// | DEFAULT_COMMISSION_RATE | 0.35 | Platform commission when a restaurant has none set |
/// | UTC_OFFSET_HOURS | 9 | Zone offset used for order-number dates |
/// | PROCESSOR_TIMEOUT_MS | 15000 | Payment processor call timeout (milliseconds) |
/// | EVENT_CHANNEL_CAPACITY | 4096 | Order event broadcast buffer |
/// | SETTLEMENT_BUFFER | 1024 | Settlement worker queue buffer |
/// | REALTIME_BUFFER | 256 | Realtime fan-out buffer |
/// | ENVIRONMENT | development | Runtime environment |
///
/// # Example
///
/// ```ignore
/// SERVICE_FEE_RATE=0.12 TAX_RATE=0.08 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Service fee charged to the customer, as a fraction of the item subtotal
    pub service_fee_rate: Decimal,
    /// Consumption tax applied to the pre-tax total
    pub tax_rate: Decimal,
    /// Commission rate used when a restaurant has no per-restaurant rate
    pub default_commission_rate: Decimal,
    /// Offset from UTC for the business day (order numbers use the zone-local date)
    pub utc_offset_hours: i32,
    /// Timeout for a single payment processor call (milliseconds)
    pub processor_timeout_ms: u64,
    /// Order event broadcast channel capacity
    pub event_channel_capacity: usize,
    /// Settlement queue buffer (critical path, sized generously)
    pub settlement_buffer: usize,
    /// Realtime fan-out buffer (best-effort)
    pub realtime_buffer: usize,
    /// Runtime environment: development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to defaults.
    pub fn from_env() -> Self {
        Self {
            service_fee_rate: std::env::var("SERVICE_FEE_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| Decimal::new(15, 2)),
            tax_rate: std::env::var("TAX_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| Decimal::new(10, 2)),
            default_commission_rate: std::env::var("DEFAULT_COMMISSION_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| Decimal::new(35, 2)),
            utc_offset_hours: std::env::var("UTC_OFFSET_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9),
            processor_timeout_ms: std::env::var("PROCESSOR_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15_000),
            event_channel_capacity: std::env::var("EVENT_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4096),
            settlement_buffer: std::env::var("SETTLEMENT_BUFFER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1024),
            realtime_buffer: std::env::var("REALTIME_BUFFER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(256),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Override the pricing rates, keeping everything else from the environment
    ///
    /// Mostly used by tests
    pub fn with_rates(service_fee_rate: Decimal, tax_rate: Decimal, commission_rate: Decimal) -> Self {
        let mut config = Self::from_env();
        config.service_fee_rate = service_fee_rate;
        config.tax_rate = tax_rate;
        config.default_commission_rate = commission_rate;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
