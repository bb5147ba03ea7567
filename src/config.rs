use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;

use crate::tracking::policy::{
    AttendancePolicy, FULL_DAY_HOURS, HALF_DAY_HOURS, REQUIRED_SHIFT_MINUTES,
};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Logging
    pub log_dir: String,
    pub log_level: tracing::Level,

    // Attendance thresholds
    pub policy: AttendancePolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| get(key).ok_or_else(|| anyhow!("{} must be set", key));

        let policy = AttendancePolicy {
            full_day_hours: parsed(&get, "FULL_DAY_HOURS", FULL_DAY_HOURS)?,
            half_day_hours: parsed(&get, "HALF_DAY_HOURS", HALF_DAY_HOURS)?,
            required_shift_minutes: parsed(&get, "REQUIRED_SHIFT_MINUTES", REQUIRED_SHIFT_MINUTES)?,
        };
        if policy.half_day_hours > policy.full_day_hours {
            return Err(anyhow!(
                "HALF_DAY_HOURS ({}) cannot exceed FULL_DAY_HOURS ({})",
                policy.half_day_hours,
                policy.full_day_hours
            ));
        }

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed(&get, "ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: parsed(&get, "REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: parsed(&get, "RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: parsed(&get, "RATE_REGISTER_PER_MIN", 30)?,
            rate_refresh_per_min: parsed(&get, "RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: parsed(&get, "RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: get("API_PREFIX").unwrap_or_else(|| "/api".to_string()),

            log_dir: get("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: parsed(&get, "LOG_LEVEL", tracing::Level::DEBUG)?,

            policy,
        })
    }
}

fn parsed<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
