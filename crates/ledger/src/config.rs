//! Token configuration

use dsp_core::DECIMALS;
use dsp_interest::DEFAULT_MAX_ANNUAL_RATE;
use dsp_policy::PolicyConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Static token settings plus the limits used for the standard policy chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_symbol")]
    pub symbol: String,

    #[serde(default = "default_decimals")]
    pub decimals: u32,

    /// Highest annual rate an administrator may set (2.0 == 200 %)
    #[serde(default = "default_max_annual_rate")]
    pub max_annual_rate: Decimal,

    #[serde(default)]
    pub policy: PolicyConfig,
}

fn default_name() -> String {
    "DSP NOK Coin".to_string()
}

fn default_symbol() -> String {
    "DSP".to_string()
}

fn default_decimals() -> u32 {
    DECIMALS
}

fn default_max_annual_rate() -> Decimal {
    DEFAULT_MAX_ANNUAL_RATE
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            symbol: default_symbol(),
            decimals: default_decimals(),
            max_annual_rate: default_max_annual_rate(),
            policy: PolicyConfig::default(),
        }
    }
}

impl TokenConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
