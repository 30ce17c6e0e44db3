use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;

use crate::report::period::WorkCalendar;
use crate::rules::geofence::{Coordinate, Geofence};

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,
    pub log_level: tracing::Level,

    // Rate limiting
    pub rate_checkin_per_min: u32,
    pub rate_protected_per_min: u32,

    // Office geofence
    pub office: Geofence,

    // Reporting
    pub calendar: WorkCalendar,
    pub report_max_days: i64,
    pub role_cache_ttl: Duration,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has an invalid value {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let office_center = Coordinate::new(
            parsed_or("OFFICE_LATITUDE", -6.1754)?,
            parsed_or("OFFICE_LONGITUDE", 106.8272)?,
        )
        .context("OFFICE_LATITUDE / OFFICE_LONGITUDE out of range")?;

        let weekend_raw = env::var("WEEKEND_DAYS").unwrap_or_else(|_| "sat,sun".to_string());
        let calendar = WorkCalendar::parse(&weekend_raw)
            .ok_or_else(|| anyhow!("WEEKEND_DAYS has an invalid value {weekend_raw:?}"))?;

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_level: parsed_or("LOG_LEVEL", tracing::Level::DEBUG)?,

            rate_checkin_per_min: parsed_or("RATE_CHECKIN_PER_MIN", 30)?,
            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,

            office: Geofence::new(office_center, parsed_or("OFFICE_RADIUS_METERS", 500.0)?),

            calendar,
            report_max_days: parsed_or("REPORT_MAX_DAYS", 366)?,
            role_cache_ttl: Duration::from_secs(parsed_or("ROLE_CACHE_TTL_SECS", 600)?),
        })
    }
}
