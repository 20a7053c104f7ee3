use anyhow::anyhow;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;

use crate::services::navigation::{ARRIVAL_THRESHOLD_M, DEFAULT_STEP_M, DEFAULT_TOTAL_DISTANCE_M};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
    pub time_zone: Tz,
    pub server_port: u16,
    /// Assumed trip length captured on every new parking session.
    pub navigation_total_distance_m: i32,
    /// Distance covered by a single navigation refresh.
    pub navigation_step_m: i32,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/parking".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "urban-parking-secret-change-this-in-production".to_string());

        let jwt_expiration_hours = parse_env("JWT_EXPIRATION_HOURS", 24);
        let server_port = parse_env("SERVER_PORT", 8080);
        let navigation_total_distance_m = trip_distance(parse_env(
            "NAVIGATION_TOTAL_DISTANCE_M",
            DEFAULT_TOTAL_DISTANCE_M,
        ));
        let navigation_step_m = parse_env("NAVIGATION_STEP_M", DEFAULT_STEP_M).max(1);

        let time_zone_name =
            env::var("APP_TIMEZONE").unwrap_or_else(|_| "Asia/Shanghai".to_string());
        let time_zone: Tz = time_zone_name
            .parse()
            .map_err(|_| anyhow!("Invalid APP_TIMEZONE value: {}", time_zone_name))?;

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_expiration_hours,
            time_zone,
            server_port,
            navigation_total_distance_m,
            navigation_step_m,
        })
    }
}

/// Trips must start outside the garage, so the assumed distance stays above
/// the arrival threshold.
fn trip_distance(configured: i32) -> i32 {
    configured.max(ARRIVAL_THRESHOLD_M + 1)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}
