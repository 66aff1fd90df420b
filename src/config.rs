//! Application-level configuration loading: operating hours, hold window, fees and API tokens.

use std::{collections::BTreeSet, env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::{
    auth::{Principal, UserRole},
    slots::{OperatingHours, Slot},
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "COURTSIDE_CONFIG_PATH";

const DEFAULT_HOLD_WINDOW_SECS: u64 = 10 * 60;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_SERVICE_FEE: i64 = 5_000;
const DEFAULT_PROTECTION_FEE: i64 = 3_000;
const DEFAULT_SSE_CAPACITY: usize = 64;

/// Flat fees added on top of the court rental price, in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fees {
    pub service_fee: i64,
    pub protection_fee: i64,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    operating_hours: OperatingHours,
    hold_window: Duration,
    sweep_interval: Duration,
    fees: Fees,
    sse_capacity: usize,
    api_tokens: Vec<(String, Principal)>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        tokens = app_config.api_tokens.len(),
                        hold_window_secs = app_config.hold_window.as_secs(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Bookable hours of every court.
    pub fn operating_hours(&self) -> &OperatingHours {
        &self.operating_hours
    }

    /// How long an unpaid booking keeps its slots.
    pub fn hold_window(&self) -> Duration {
        self.hold_window
    }

    /// Period of the expiry sweep.
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Flat fees applied to every booking.
    pub fn fees(&self) -> Fees {
        self.fees
    }

    /// Buffer size of the SSE broadcast channel.
    pub fn sse_capacity(&self) -> usize {
        self.sse_capacity
    }

    /// Bearer tokens accepted by the API.
    pub fn api_tokens(&self) -> &[(String, Principal)] {
        &self.api_tokens
    }

    /// Replace the configured bearer tokens.
    pub fn with_api_tokens(mut self, tokens: Vec<(String, Principal)>) -> Self {
        self.api_tokens = tokens;
        self
    }

    /// Replace the operating window.
    pub fn with_operating_hours(mut self, hours: OperatingHours) -> Self {
        self.operating_hours = hours;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            operating_hours: OperatingHours::default(),
            hold_window: Duration::from_secs(DEFAULT_HOLD_WINDOW_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            fees: Fees {
                service_fee: DEFAULT_SERVICE_FEE,
                protection_fee: DEFAULT_PROTECTION_FEE,
            },
            sse_capacity: DEFAULT_SSE_CAPACITY,
            api_tokens: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    operating_hours: Option<RawOperatingHours>,
    #[serde(default = "default_hold_window_secs")]
    hold_window_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    sweep_interval_secs: u64,
    #[serde(default = "default_service_fee")]
    service_fee: i64,
    #[serde(default = "default_protection_fee")]
    protection_fee: i64,
    #[serde(default = "default_sse_capacity")]
    sse_capacity: usize,
    #[serde(default)]
    api_tokens: Vec<RawToken>,
}

#[derive(Debug, Deserialize)]
struct RawOperatingHours {
    open_hour: u8,
    close_hour: u8,
    #[serde(default)]
    closed_slots: Vec<Slot>,
}

#[derive(Debug, Deserialize)]
struct RawToken {
    token: String,
    user_id: Uuid,
    role: UserRole,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();

        let operating_hours = match value.operating_hours {
            Some(raw) => OperatingHours::new(
                raw.open_hour,
                raw.close_hour,
                raw.closed_slots.into_iter().collect::<BTreeSet<_>>(),
            )
            .unwrap_or_else(|| {
                warn!(
                    open_hour = raw.open_hour,
                    close_hour = raw.close_hour,
                    "inconsistent operating hours; using defaults"
                );
                defaults.operating_hours.clone()
            }),
            None => defaults.operating_hours.clone(),
        };

        let api_tokens = value
            .api_tokens
            .into_iter()
            .filter(|raw| !raw.token.trim().is_empty())
            .map(|raw| {
                (
                    raw.token,
                    Principal {
                        user_id: raw.user_id,
                        role: raw.role,
                    },
                )
            })
            .collect();

        Self {
            operating_hours,
            hold_window: Duration::from_secs(value.hold_window_secs.max(1)),
            sweep_interval: Duration::from_secs(value.sweep_interval_secs.max(1)),
            fees: Fees {
                service_fee: value.service_fee.max(0),
                protection_fee: value.protection_fee.max(0),
            },
            sse_capacity: value.sse_capacity.max(1),
            api_tokens,
        }
    }
}

fn default_hold_window_secs() -> u64 {
    DEFAULT_HOLD_WINDOW_SECS
}

fn default_sweep_interval_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

fn default_service_fee() -> i64 {
    DEFAULT_SERVICE_FEE
}

fn default_protection_fee() -> i64 {
    DEFAULT_PROTECTION_FEE
}

fn default_sse_capacity() -> usize {
    DEFAULT_SSE_CAPACITY
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_config_applies_defaults() {
        let raw: RawConfig = serde_json::from_str("{}").unwrap();
        let config: AppConfig = raw.into();

        assert_eq!(config.hold_window(), Duration::from_secs(600));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.fees().service_fee, DEFAULT_SERVICE_FEE);
        assert!(config.api_tokens().is_empty());
    }

    #[test]
    fn raw_config_reads_hours_and_tokens() {
        let user_id = Uuid::new_v4();
        let json = format!(
            r#"{{
                "operating_hours": {{
                    "open_hour": 8,
                    "close_hour": 22,
                    "closed_slots": ["12:00"]
                }},
                "hold_window_secs": 300,
                "api_tokens": [{{ "token": "abc", "user_id": "{user_id}", "role": "admin" }}]
            }}"#
        );
        let raw: RawConfig = serde_json::from_str(&json).unwrap();
        let config: AppConfig = raw.into();

        let hours = config.operating_hours();
        assert!(hours.contains("08:00".parse().unwrap()));
        assert!(!hours.contains("12:00".parse().unwrap()));
        assert!(!hours.contains("22:00".parse().unwrap()));
        assert_eq!(config.hold_window(), Duration::from_secs(300));
        assert_eq!(config.api_tokens()[0].1.role, UserRole::Admin);
    }

    #[test]
    fn inconsistent_hours_fall_back_to_defaults() {
        let raw: RawConfig = serde_json::from_str(
            r#"{ "operating_hours": { "open_hour": 20, "close_hour": 8 } }"#,
        )
        .unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.operating_hours(), &OperatingHours::default());
    }
}
