use std::env;
use std::str::FromStr;

use chrono::{Duration, FixedOffset};
use derive_more::Display;
use dotenvy::dotenv;
use rust_decimal::Decimal;

use crate::engine::EngineSettings;
use crate::engine::tee::TeeSettings;
use crate::model::employee::RosterFilter;

#[derive(Debug, Display, PartialEq)]
pub enum ConfigError {
    #[display(fmt = "{} must be set", _0)]
    Missing(&'static str),
    #[display(fmt = "{} has an invalid value: {:?}", _0, _1)]
    Invalid(&'static str, String),
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub api_prefix: String,
    pub db_max_connections: u32,

    // Rate limiting
    pub rate_protected_per_min: u32,

    // Reconciliation rules
    pub auto_punchout_hours: i64,
    pub non_bio_imputed_hours: Decimal,
    pub standard_shift_hours: Decimal,
    pub late_threshold_minutes: u32,
    pub tee_window_weeks: u32,
    pub tee_min_samples: usize,
    pub max_range_days: u32,
    pub metrics_cache_ttl_secs: u64,
    pub employee_filter_refresh_secs: u64,

    /// `None` runs on the server's local time.
    pub timezone: Option<FixedOffset>,
    pub excluded_departments: Vec<String>,
    pub placeholder_names: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let timezone = match lookup("TZ_OFFSET_MINUTES") {
            None => None,
            Some(raw) => {
                let minutes: i32 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("TZ_OFFSET_MINUTES", raw.clone()))?;
                let offset = minutes
                    .checked_mul(60)
                    .and_then(FixedOffset::east_opt)
                    .ok_or(ConfigError::Invalid("TZ_OFFSET_MINUTES", raw))?;
                Some(offset)
            }
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_addr: required("SERVER_ADDR")?,
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            rate_protected_per_min: parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,
            auto_punchout_hours: parse_or(&lookup, "AUTO_PUNCHOUT_HOURS", 9)?,
            non_bio_imputed_hours: parse_or(&lookup, "NON_BIO_IMPUTED_HOURS", Decimal::from(8))?,
            standard_shift_hours: parse_or(&lookup, "STANDARD_SHIFT_HOURS", Decimal::from(8))?,
            late_threshold_minutes: parse_or(&lookup, "LATE_THRESHOLD_MINUTES", 570)?, // 09:30
            tee_window_weeks: parse_or(&lookup, "TEE_WINDOW_WEEKS", 8)?,
            tee_min_samples: parse_or(&lookup, "TEE_MIN_SAMPLES", 2)?,
            max_range_days: parse_or(&lookup, "MAX_RANGE_DAYS", 90)?,
            metrics_cache_ttl_secs: parse_or(&lookup, "METRICS_CACHE_TTL_SECS", 60)?,
            employee_filter_refresh_secs: parse_or(&lookup, "EMPLOYEE_FILTER_REFRESH_SECS", 300)?,
            timezone,
            excluded_departments: list(&lookup, "EXCLUDED_DEPARTMENTS", &[]),
            placeholder_names: list(&lookup, "PLACEHOLDER_NAMES", &["NOC"]),
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            auto_punchout_window: Duration::hours(self.auto_punchout_hours),
            non_bio_hours: self.non_bio_imputed_hours,
            standard_shift_hours: self.standard_shift_hours,
            late_threshold_minutes: self.late_threshold_minutes,
            tee: TeeSettings {
                window_weeks: self.tee_window_weeks,
                min_samples: self.tee_min_samples,
            },
            max_range_days: self.max_range_days,
            roster_filter: RosterFilter {
                excluded_departments: self.excluded_departments.clone(),
                placeholder_names: self.placeholder_names.clone(),
            },
        }
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(key, raw)),
    }
}

fn list(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &[&str]) -> Vec<String> {
    match lookup(key) {
        None => default.iter().map(|s| s.to_string()).collect(),
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    }
}
