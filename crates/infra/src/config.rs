//! Ledger configuration loaded from the environment.

use std::time::Duration as StdDuration;

use chrono::Duration;
use thiserror::Error;

use stockhold_inventory::policy::{
    DEFAULT_EXPIRING_SOON_MINUTES, DEFAULT_MAX_QUANTITY_PER_RESERVATION,
    DEFAULT_MAX_STOCK_PER_ITEM, DEFAULT_TTL_MINUTES,
};
use stockhold_inventory::{ExpirationPolicy, ReservationPolicy, StockValidationPolicy};

pub const ENV_RESERVATION_TTL_MINUTES: &str = "STOCKHOLD_RESERVATION_TTL_MINUTES";
pub const ENV_MAX_QUANTITY_PER_RESERVATION: &str = "STOCKHOLD_MAX_QUANTITY_PER_RESERVATION";
pub const ENV_EXPIRING_SOON_MINUTES: &str = "STOCKHOLD_EXPIRING_SOON_MINUTES";
pub const ENV_LOCK_TIMEOUT_MS: &str = "STOCKHOLD_LOCK_TIMEOUT_MS";
pub const ENV_MAX_STOCK_PER_ITEM: &str = "STOCKHOLD_MAX_STOCK_PER_ITEM";
pub const ENV_SWEEPER_ENABLED: &str = "STOCKHOLD_SWEEPER_ENABLED";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "STOCKHOLD_SWEEP_INTERVAL_SECS";
pub const ENV_PURGE_RETENTION_HOURS: &str = "STOCKHOLD_PURGE_RETENTION_HOURS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Background expiry sweeper settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweeperConfig {
    pub enabled: bool,
    pub interval: StdDuration,
    /// Settled reservations older than this (past `expires_at`) are purged.
    pub purge_retention: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: StdDuration::from_secs(60),
            purge_retention: Duration::hours(24),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub reservation_ttl: Duration,
    pub max_quantity_per_reservation: i64,
    pub expiring_soon: Duration,
    pub lock_timeout: StdDuration,
    pub max_stock_per_item: i64,
    pub sweeper: SweeperConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            reservation_ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
            max_quantity_per_reservation: DEFAULT_MAX_QUANTITY_PER_RESERVATION,
            expiring_soon: Duration::minutes(DEFAULT_EXPIRING_SOON_MINUTES),
            lock_timeout: StdDuration::from_millis(5_000),
            max_stock_per_item: DEFAULT_MAX_STOCK_PER_ITEM,
            sweeper: SweeperConfig::default(),
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let ttl_minutes = positive(&lookup, ENV_RESERVATION_TTL_MINUTES, DEFAULT_TTL_MINUTES)?;
        let max_quantity = positive(
            &lookup,
            ENV_MAX_QUANTITY_PER_RESERVATION,
            DEFAULT_MAX_QUANTITY_PER_RESERVATION,
        )?;
        let expiring_soon = non_negative(
            &lookup,
            ENV_EXPIRING_SOON_MINUTES,
            DEFAULT_EXPIRING_SOON_MINUTES,
        )?;
        let lock_timeout_ms = positive(&lookup, ENV_LOCK_TIMEOUT_MS, 5_000)?;
        let max_stock = positive(&lookup, ENV_MAX_STOCK_PER_ITEM, DEFAULT_MAX_STOCK_PER_ITEM)?;
        let sweep_secs = positive(&lookup, ENV_SWEEP_INTERVAL_SECS, 60)?;
        let retention_hours = non_negative(&lookup, ENV_PURGE_RETENTION_HOURS, 24)?;
        let enabled = flag(&lookup, ENV_SWEEPER_ENABLED, defaults.sweeper.enabled)?;

        Ok(Self {
            reservation_ttl: Duration::minutes(ttl_minutes),
            max_quantity_per_reservation: max_quantity,
            expiring_soon: Duration::minutes(expiring_soon),
            lock_timeout: StdDuration::from_millis(lock_timeout_ms as u64),
            max_stock_per_item: max_stock,
            sweeper: SweeperConfig {
                enabled,
                interval: StdDuration::from_secs(sweep_secs as u64),
                purge_retention: Duration::hours(retention_hours),
            },
        })
    }

    pub fn reservation_policy(&self) -> ReservationPolicy {
        ReservationPolicy::new(self.reservation_ttl, self.max_quantity_per_reservation)
    }

    pub fn expiration_policy(&self) -> ExpirationPolicy {
        ExpirationPolicy::new(self.expiring_soon)
    }

    pub fn stock_validation_policy(&self) -> StockValidationPolicy {
        StockValidationPolicy::new(self.max_stock_per_item)
    }
}

fn integer<F>(lookup: &F, key: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<i64>().map_err(|_| ConfigError::Invalid {
            key,
            value: raw,
            reason: "expected an integer",
        }),
    }
}

fn positive<F>(lookup: &F, key: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = integer(lookup, key, default)?;
    if value <= 0 {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "must be greater than zero",
        });
    }
    Ok(value)
}

fn non_negative<F>(lookup: &F, key: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = integer(lookup, key, default)?;
    if value < 0 {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "must not be negative",
        });
    }
    Ok(value)
}

fn flag<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key,
                value: raw,
                reason: "expected a boolean",
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> Result<LedgerConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LedgerConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = from(&[]).unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.reservation_policy().ttl_minutes(), 15);
        assert_eq!(config.reservation_policy().max_quantity(), 100);
        assert!(!config.sweeper.enabled);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = from(&[
            (ENV_RESERVATION_TTL_MINUTES, "30"),
            (ENV_MAX_QUANTITY_PER_RESERVATION, "5"),
            (ENV_LOCK_TIMEOUT_MS, "250"),
            (ENV_SWEEPER_ENABLED, "true"),
            (ENV_SWEEP_INTERVAL_SECS, "10"),
        ])
        .unwrap();
        assert_eq!(config.reservation_ttl, Duration::minutes(30));
        assert_eq!(config.max_quantity_per_reservation, 5);
        assert_eq!(config.lock_timeout, StdDuration::from_millis(250));
        assert!(config.sweeper.enabled);
        assert_eq!(config.sweeper.interval, StdDuration::from_secs(10));
    }

    #[test]
    fn zero_ttl_and_garbage_are_rejected() {
        assert!(matches!(
            from(&[(ENV_RESERVATION_TTL_MINUTES, "0")]),
            Err(ConfigError::Invalid { key: ENV_RESERVATION_TTL_MINUTES, .. })
        ));
        assert!(from(&[(ENV_MAX_QUANTITY_PER_RESERVATION, "0")]).is_err());
        assert!(from(&[(ENV_LOCK_TIMEOUT_MS, "soon")]).is_err());
        assert!(from(&[(ENV_SWEEPER_ENABLED, "maybe")]).is_err());
    }
}
