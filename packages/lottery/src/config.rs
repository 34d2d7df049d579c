use std::env;
use std::str::FromStr;

use alloy_primitives::{utils::parse_ether, B256, U256};
use serde::{Deserialize, Serialize};

use crate::errors::LotteryError;
use crate::types::OracleRequestParams;

/// Immutable configuration of a lottery instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryConfig {
    /// Minimum contribution, in wei
    pub entry_fee: U256,
    /// Minimum seconds between draws
    pub interval_secs: u64,
    /// Parameters forwarded with every randomness request
    #[serde(default)]
    pub oracle: OracleRequestParams,
    /// Age after which an unanswered randomness request may be expired.
    /// `None` keeps a drawing round waiting forever.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            entry_fee: U256::from(10_000_000_000_000_000u64), // 0.01 ether
            interval_secs: 30,
            oracle: OracleRequestParams::default(),
            request_timeout_secs: None,
        }
    }
}

impl LotteryConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, LotteryError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LotteryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let entry_fee = match lookup("ENTRY_FEE_ETH") {
            Some(value) => parse_ether(value.trim()).map_err(|e| {
                LotteryError::Config(format!("Invalid ENTRY_FEE_ETH '{}': {}", value, e))
            })?,
            None => defaults.entry_fee,
        };

        let interval_secs = parse_or("INTERVAL_SECS", &lookup, defaults.interval_secs)?;

        let key_hash = match lookup("KEY_HASH") {
            Some(value) => B256::from_str(value.trim()).map_err(|e| {
                LotteryError::Config(format!("Invalid KEY_HASH '{}': {}", value, e))
            })?,
            None => defaults.oracle.key_hash,
        };

        let oracle = OracleRequestParams {
            key_hash,
            subscription_id: parse_or(
                "SUBSCRIPTION_ID",
                &lookup,
                defaults.oracle.subscription_id,
            )?,
            request_confirmations: parse_or(
                "REQUEST_CONFIRMATIONS",
                &lookup,
                defaults.oracle.request_confirmations,
            )?,
            callback_gas_limit: parse_or(
                "CALLBACK_GAS_LIMIT",
                &lookup,
                defaults.oracle.callback_gas_limit,
            )?,
            num_words: defaults.oracle.num_words,
        };

        let request_timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(value) => Some(value.trim().parse().map_err(|_| {
                LotteryError::Config(format!("Invalid REQUEST_TIMEOUT_SECS '{}'", value))
            })?),
            None => defaults.request_timeout_secs,
        };

        let config = Self {
            entry_fee,
            interval_secs,
            oracle,
            request_timeout_secs,
        };
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, LotteryError> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            LotteryError::Config(format!("Failed to parse lottery config JSON: {}", e))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Serialize the configuration to a JSON string
    pub fn to_json(&self) -> Result<String, LotteryError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LotteryError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Validate the configuration for logical consistency
    pub fn validate(&self) -> Result<(), LotteryError> {
        if self.oracle.num_words == 0 {
            return Err(LotteryError::Config(
                "oracle.num_words must request at least one word".to_string(),
            ));
        }

        if self.oracle.callback_gas_limit == 0 {
            return Err(LotteryError::Config(
                "oracle.callback_gas_limit must be positive".to_string(),
            ));
        }

        if self.request_timeout_secs == Some(0) {
            return Err(LotteryError::Config(
                "request_timeout_secs must be positive when set".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, LotteryError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| LotteryError::Config(format!("Invalid {} '{}'", key, value))),
        None => Ok(default),
    }
}
