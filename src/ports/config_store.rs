use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{PhonePolicy, TaxRate};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    ReadError(String),

    #[error("Failed to write configuration: {0}")]
    WriteError(String),

    #[error("Invalid configuration format: {0}")]
    InvalidFormat(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub cache_ttl_seconds: u64,
    /// Rows per page in project, draft and client listings.
    pub page_size: usize,
    pub project_tax_rate: TaxRate,
    pub invoice_tax_rate: TaxRate,
    pub financing_fee_percent: Decimal,
    pub phone_policy: PhonePolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            cache_ttl_seconds: 300, // 5 minutes
            page_size: 6,
            project_tax_rate: TaxRate::project_gst(),
            invoice_tax_rate: TaxRate::invoice(),
            financing_fee_percent: Decimal::from(20),
            phone_policy: PhonePolicy::default(),
        }
    }
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load_config(&self) -> ConfigResult<AppConfig>;
    async fn save_config(&self, config: &AppConfig) -> ConfigResult<()>;
}
