//! Application configuration loaded from environment variables.

use std::time::Duration as StdDuration;

use chrono::Duration;
use domain::authz::{DEFAULT_PLATFORM_ORG, DEFAULT_SELLER_ORG, DEFAULT_SHIPPER_ORG};
use domain::{Organizations, SettlementPolicy, SettlementProfile, UnknownProfile};
use thiserror::Error;

/// A configuration variable that could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid value for SETTLEMENT_PROFILE: {0}")]
    Profile(#[from] UnknownProfile),
}

impl ConfigError {
    /// Returns the variable that failed to parse.
    pub fn key(&self) -> &'static str {
        match self {
            ConfigError::Invalid { key, .. } => *key,
            ConfigError::Profile(_) => "SETTLEMENT_PROFILE",
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` for JSON log lines, human-readable otherwise
/// - `DATABASE_URL`: Postgres ledger; in-memory ledger when unset
/// - `SETTLEMENT_PROFILE`: `production` (default) or `demo`
/// - `PAYOUT_DELAY_SECS`, `RETURN_WINDOW_SECS`: override the profile's durations
/// - `PAYOUT_SWEEP_INTERVAL_SECS`: run the payout sweeper; disabled when unset or 0
/// - `PLATFORM_ORG_ID`, `SELLER_ORG_ID`, `SHIPPER_ORG_ID`: organization ids
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_json: bool,
    pub database_url: Option<String>,
    pub profile: SettlementProfile,
    pub policy: SettlementPolicy,
    pub sweep_interval: Option<StdDuration>,
    pub organizations: Organizations,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => parse(&raw, "PORT")?,
            None => 3000,
        };

        let profile = match var("SETTLEMENT_PROFILE") {
            Some(raw) => raw.parse()?,
            None => SettlementProfile::default(),
        };

        let mut policy = profile.policy();
        if let Some(raw) = var("PAYOUT_DELAY_SECS") {
            policy = policy.with_payout_delay(parse_secs(&raw, "PAYOUT_DELAY_SECS")?);
        }
        if let Some(raw) = var("RETURN_WINDOW_SECS") {
            policy = policy.with_return_window(parse_secs(&raw, "RETURN_WINDOW_SECS")?);
        }

        let sweep_interval = match var("PAYOUT_SWEEP_INTERVAL_SECS") {
            Some(raw) => match parse::<u64>(&raw, "PAYOUT_SWEEP_INTERVAL_SECS")? {
                0 => None,
                secs => Some(StdDuration::from_secs(secs)),
            },
            None => None,
        };

        let organizations = Organizations::new(
            var("PLATFORM_ORG_ID").unwrap_or_else(|| DEFAULT_PLATFORM_ORG.to_string()),
            var("SELLER_ORG_ID").unwrap_or_else(|| DEFAULT_SELLER_ORG.to_string()),
            var("SHIPPER_ORG_ID").unwrap_or_else(|| DEFAULT_SHIPPER_ORG.to_string()),
        );

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            log_level: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            log_json: var("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            database_url: var("DATABASE_URL"),
            profile,
            policy,
            sweep_interval,
            organizations,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        let profile = SettlementProfile::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_json: false,
            database_url: None,
            profile,
            policy: profile.policy(),
            sweep_interval: None,
            organizations: Organizations::default(),
        }
    }
}

fn parse<T>(raw: &str, key: &'static str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Parses a non-negative number of seconds that fits a chrono duration.
fn parse_secs(raw: &str, key: &'static str) -> Result<Duration, ConfigError> {
    let secs: u64 = parse(raw, key)?;
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "duration out of range".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert!(config.database_url.is_none());
        assert_eq!(config.profile, SettlementProfile::Production);
        assert_eq!(config.policy.payout_delay(), Duration::days(7));
        assert!(config.sweep_interval.is_none());
        assert_eq!(config.organizations, Organizations::default());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(Config::default().addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_demo_profile_with_overrides() {
        let config = load(&[
            ("SETTLEMENT_PROFILE", "Demo"),
            ("RETURN_WINDOW_SECS", "90"),
            ("PAYOUT_SWEEP_INTERVAL_SECS", "30"),
        ])
        .unwrap();
        assert_eq!(config.profile, SettlementProfile::Demo);
        assert_eq!(config.policy.payout_delay(), Duration::minutes(5));
        assert_eq!(config.policy.return_window(), Duration::seconds(90));
        assert_eq!(config.sweep_interval, Some(StdDuration::from_secs(30)));
    }

    #[test]
    fn test_json_log_format() {
        assert!(load(&[("LOG_FORMAT", "JSON")]).unwrap().log_json);
        assert!(!load(&[("LOG_FORMAT", "pretty")]).unwrap().log_json);
    }

    #[test]
    fn test_zero_sweep_interval_disables_sweeper() {
        let config = load(&[("PAYOUT_SWEEP_INTERVAL_SECS", "0")]).unwrap();
        assert!(config.sweep_interval.is_none());
    }

    #[test]
    fn test_organization_overrides() {
        let config = load(&[("SHIPPER_ORG_ID", "CarrierMSP")]).unwrap();
        assert_eq!(config.organizations.shipper.as_str(), "CarrierMSP");
        assert_eq!(config.organizations.seller.as_str(), DEFAULT_SELLER_ORG);
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.key(), "PORT");

        let err = load(&[("SETTLEMENT_PROFILE", "staging")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Profile(UnknownProfile("staging".to_string()))
        );
        assert_eq!(err.key(), "SETTLEMENT_PROFILE");

        let err = load(&[("PAYOUT_DELAY_SECS", "-")]).unwrap_err();
        assert_eq!(err.key(), "PAYOUT_DELAY_SECS");
    }

    #[test]
    fn test_negative_durations_are_rejected() {
        let err = load(&[("PAYOUT_DELAY_SECS", "-1")]).unwrap_err();
        assert_eq!(err.key(), "PAYOUT_DELAY_SECS");

        let err = load(&[("RETURN_WINDOW_SECS", "-3600")]).unwrap_err();
        assert_eq!(err.key(), "RETURN_WINDOW_SECS");
    }

    #[test]
    fn test_out_of_range_durations_are_rejected() {
        let err = load(&[("PAYOUT_DELAY_SECS", "9223372036854775807")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "PAYOUT_DELAY_SECS",
                value: "9223372036854775807".to_string(),
                reason: "duration out of range".to_string(),
            }
        );

        let err = load(&[("RETURN_WINDOW_SECS", "18446744073709551615")]).unwrap_err();
        assert_eq!(err.key(), "RETURN_WINDOW_SECS");

        let config = load(&[("PAYOUT_DELAY_SECS", "0")]).unwrap();
        assert_eq!(config.policy.payout_delay(), Duration::zero());
    }
}
