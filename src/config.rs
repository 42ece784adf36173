use rust_decimal::Decimal;
use serde::Deserialize;

/// Typed application configuration, built once at startup and handed by
/// value into the constructors of the ledger, matching, settlement and
/// indexer services. There is no process-wide singleton beyond this struct
/// living inside `AppState`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_environment")]
    pub environment: String,

    pub database_url: String,

    /// Shared secret compared in constant time against the `Authorization`
    /// header for operator-only routes. Required, no default.
    pub admin_token: String,

    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_format")]
    pub log_format: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub chain: ChainConfig,

    #[serde(default = "default_fee_rate")]
    pub platform_fee_rate: Decimal,

    #[serde(default = "default_min_order")]
    pub min_order_size_kopecks: i64,

    #[serde(default = "default_max_order")]
    pub max_order_size_kopecks: i64,
}

/// Deposit-indexer specific settings; mirrors the source repository's
/// separate TON settings block.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_indexer_enabled")]
    pub indexer_enabled: bool,

    #[serde(default = "default_chain_api_url")]
    pub api_url: String,

    pub api_key: Option<String>,

    #[serde(default = "default_receiving_address")]
    pub receiving_address: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Integer conversion factor from the chain's smallest unit to kopecks.
    /// A value of `0` means "not meaningfully configured"; the indexer
    /// refuses to credit deposits in that case rather than crediting zero.
    #[serde(default)]
    pub deposit_rate: i64,

    #[serde(default = "default_min_deposit")]
    pub min_deposit_chain_units: i64,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            indexer_enabled: default_indexer_enabled(),
            api_url: default_chain_api_url(),
            api_key: None,
            receiving_address: default_receiving_address(),
            poll_interval_secs: default_poll_interval(),
            deposit_rate: 0,
            min_deposit_chain_units: default_min_deposit(),
            retry_attempts: default_retry_attempts(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

fn default_environment() -> String {
    "development".to_string()
}
fn default_allowed_origins() -> String {
    "http://localhost:5173,http://localhost:3000".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_fee_rate() -> Decimal {
    Decimal::new(2, 2) // 0.02
}
fn default_min_order() -> i64 {
    100
}
fn default_max_order() -> i64 {
    100_000_000
}
fn default_indexer_enabled() -> bool {
    true
}
fn default_chain_api_url() -> String {
    "https://toncenter.com/api/v2".to_string()
}
fn default_receiving_address() -> String {
    String::new()
}
fn default_poll_interval() -> u64 {
    10
}
fn default_min_deposit() -> i64 {
    0
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    2
}

impl AppConfig {
    /// Loads configuration from the process environment (after `.env` has
    /// already been merged in by `dotenvy::dotenv()` in `main`), then runs
    /// the same fail-fast production checks as the source settings module.
    pub fn load() -> anyhow::Result<Self> {
        let raw = config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true).separator("__"))
            .build()?;

        let cfg: AppConfig = raw.try_deserialize().map_err(|e| {
            anyhow::anyhow!("failed to load configuration from environment: {e}")
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn allowed_origins_list(&self) -> Vec<String> {
        if self.allowed_origins == "*" {
            return vec!["*".to_string()];
        }
        self.allowed_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .collect()
    }

    pub fn use_json_logs(&self) -> bool {
        self.log_format == "json"
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.is_production() {
            if self.database_url.starts_with("sqlite") {
                anyhow::bail!("sqlite is not allowed in production; set DATABASE_URL to PostgreSQL");
            }
            if self.allowed_origins == "*" {
                anyhow::bail!("CORS wildcard '*' is not allowed in production");
            }
        }
        Ok(())
    }
}
