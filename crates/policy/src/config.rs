//! Policy limits with configurable thresholds
//!
//! Every limit can be overridden from a JSON file. Missing fields keep the
//! defaults below.

use dsp_core::{Amount, ONE_YEAR};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, PolicyResult};

/// Limits used when building the standard policies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    // === Balance cap ===
    /// Fixed receiver balance cap
    #[serde(default = "default_balance_cap")]
    pub balance_cap: Amount,

    /// When set, the cap is this fraction of total supply instead
    #[serde(default)]
    pub balance_cap_fraction: Option<Decimal>,

    // === Spending windows ===
    #[serde(default = "default_weekly_spending_limit")]
    pub weekly_spending_limit: Amount,

    #[serde(default = "default_anonymous_transaction_limit")]
    pub anonymous_transaction_limit: Amount,

    #[serde(default = "default_anonymous_daily_limit")]
    pub anonymous_daily_limit: Amount,

    #[serde(default = "default_anonymous_weekly_limit")]
    pub anonymous_weekly_limit: Amount,

    // === Authentication ===
    /// Seconds a person authentication stays valid for sending
    #[serde(default = "default_authentication_validity_secs")]
    pub authentication_validity_secs: i64,
}

// Default value functions for serde
fn default_balance_cap() -> Amount {
    Amount::new_unchecked(Decimal::new(500, 0))
}

fn default_weekly_spending_limit() -> Amount {
    Amount::new_unchecked(Decimal::new(1_000, 0))
}

fn default_anonymous_transaction_limit() -> Amount {
    Amount::new_unchecked(Decimal::new(10, 0))
}

fn default_anonymous_daily_limit() -> Amount {
    Amount::new_unchecked(Decimal::new(100, 0))
}

fn default_anonymous_weekly_limit() -> Amount {
    Amount::new_unchecked(Decimal::new(200, 0))
}

fn default_authentication_validity_secs() -> i64 {
    ONE_YEAR
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            balance_cap: default_balance_cap(),
            balance_cap_fraction: None,
            weekly_spending_limit: default_weekly_spending_limit(),
            anonymous_transaction_limit: default_anonymous_transaction_limit(),
            anonymous_daily_limit: default_anonymous_daily_limit(),
            anonymous_weekly_limit: default_anonymous_weekly_limit(),
            authentication_validity_secs: default_authentication_validity_secs(),
        }
    }
}

impl PolicyConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Reject settings no policy can work with
    pub fn validate(&self) -> PolicyResult<()> {
        if let Some(fraction) = self.balance_cap_fraction {
            if fraction <= Decimal::ZERO || fraction > Decimal::ONE {
                return Err(PolicyError::ConfigError(format!(
                    "balance_cap_fraction must be in (0, 1], got {fraction}"
                )));
            }
        }
        if self.authentication_validity_secs <= 0 {
            return Err(PolicyError::ConfigError(
                "authentication_validity_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PolicyConfig::default();

        assert_eq!(config.balance_cap.value(), dec!(500));
        assert_eq!(config.balance_cap_fraction, None);
        assert_eq!(config.weekly_spending_limit.value(), dec!(1000));
        assert_eq!(config.anonymous_transaction_limit.value(), dec!(10));
        assert_eq!(config.anonymous_daily_limit.value(), dec!(100));
        assert_eq!(config.anonymous_weekly_limit.value(), dec!(200));
        assert_eq!(config.authentication_validity_secs, 31_536_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"weekly_spending_limit": "250"}}"#).unwrap();

        let config = PolicyConfig::from_file(file.path()).unwrap();
        assert_eq!(config.weekly_spending_limit.value(), dec!(250));
        assert_eq!(config.anonymous_daily_limit.value(), dec!(100));
    }

    #[test]
    fn test_invalid_file_is_invalid_data() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"balance_cap": "-5"}}"#).unwrap();

        let err = PolicyConfig::from_file(file.path()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_validate_fraction() {
        let config = PolicyConfig {
            balance_cap_fraction: Some(dec!(1.5)),
            ..PolicyConfig::default()
        };
        assert!(matches!(config.validate(), Err(PolicyError::ConfigError(_))));
    }
}
