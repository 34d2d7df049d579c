use alloy_primitives::B256;
use anyhow::{anyhow, Context, Result};
use std::{env, str::FromStr};
use wavs_lottery::LotteryConfig;

#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub lottery: LotteryConfig,

    pub upkeep_period_in_secs: u64,
    pub reveal_delay_ms: u64,
    pub oracle_secret: Option<B256>,
    pub console_enabled: bool,

    pub log_level: String,
    pub log_format: String,
    pub log_color: bool,
}

pub fn load() -> Result<RuntimeConfig> {
    let _ = dotenvy::dotenv();

    let lottery = LotteryConfig::from_env().context("invalid lottery configuration")?;
    load_from(lottery, |key| env::var(key).ok())
}

/// Unset keys take their default, malformed values are errors
fn load_from<F>(lottery: LotteryConfig, lookup: F) -> Result<RuntimeConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let upkeep_period_in_secs = env_parse(&lookup, "UPKEEP_PERIOD_IN_SECS")
        .context("UPKEEP_PERIOD_IN_SECS must be a number")?
        .unwrap_or(5);
    let reveal_delay_ms = env_parse(&lookup, "REVEAL_DELAY_MS")
        .context("REVEAL_DELAY_MS must be a number of milliseconds")?
        .unwrap_or(2_000);
    let oracle_secret = env_parse::<B256, _>(&lookup, "ORACLE_SECRET")
        .context("ORACLE_SECRET must be 32 bytes of hex")?;
    let console_enabled = env_parse(&lookup, "CONSOLE_ENABLED")
        .context("CONSOLE_ENABLED must be true or false")?
        .unwrap_or(true);

    let log_level = env_str(&lookup, "LOG_LEVEL").unwrap_or_else(|| "info".to_string());
    let log_format = env_str(&lookup, "LOG_FORMAT").unwrap_or_else(|| "pretty".to_string());
    let log_color = env_parse(&lookup, "LOG_COLOR")
        .context("LOG_COLOR must be true or false")?
        .unwrap_or(true);

    Ok(RuntimeConfig {
        lottery,
        upkeep_period_in_secs,
        reveal_delay_ms,
        oracle_secret,
        console_enabled,
        log_level,
        log_format,
        log_color,
    })
}

fn env_str<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match env_str(lookup, key) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("invalid {}='{}': {}", key, value, e)),
        None => Ok(None),
    }
}
