use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Parse `var` (or `default` when unset) into `T`.
fn parse_var<T, F>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = require("DATABASE_URL")?;
    let social_api_key = require("AKARI_SOCIAL_API_KEY")?;
    let scoring_url = require("AKARI_SCORING_URL")?;

    let env = parse_environment(&or_default("AKARI_ENV", "development"))?;
    let log_level = or_default("AKARI_LOG_LEVEL", "info");
    let projects_path = PathBuf::from(or_default("AKARI_PROJECTS_PATH", "./config/projects.yaml"));

    let db_max_connections = parse_var(&lookup, "AKARI_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_var(&lookup, "AKARI_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_var(&lookup, "AKARI_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let social_base_url = or_default("AKARI_SOCIAL_BASE_URL", "https://api.twitterapi.io");
    let scoring_api_key = lookup("AKARI_SCORING_API_KEY")
        .ok()
        .filter(|v| !v.trim().is_empty());
    let request_timeout_secs = parse_var(&lookup, "AKARI_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("AKARI_USER_AGENT", "akari/0.1 (circle-engine)");
    let max_retries = parse_var(&lookup, "AKARI_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_var(&lookup, "AKARI_RETRY_BACKOFF_BASE_MS", "1000")?;
    let inter_call_delay_ms = parse_var(&lookup, "AKARI_INTER_CALL_DELAY_MS", "1000")?;

    let rescore_batch_size = parse_var(&lookup, "AKARI_RESCORE_BATCH_SIZE", "50")?;
    let rescore_stale_days: i64 = parse_var(&lookup, "AKARI_RESCORE_STALE_DAYS", "7")?;
    if rescore_stale_days < 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "AKARI_RESCORE_STALE_DAYS".to_string(),
            reason: "must not be negative".to_string(),
        });
    }
    let global_circle_max = parse_var(&lookup, "AKARI_GLOBAL_CIRCLE_MAX", "500")?;
    let follower_sample_size = parse_var(&lookup, "AKARI_FOLLOWER_SAMPLE_SIZE", "100")?;
    let mention_sample_size = parse_var(&lookup, "AKARI_MENTION_SAMPLE_SIZE", "50")?;
    let quality_follower_min = parse_var(&lookup, "AKARI_QUALITY_FOLLOWER_MIN", "1000")?;

    let min_authenticity = parse_var(&lookup, "AKARI_MIN_AUTHENTICITY", "60")?;
    let min_signal_density = parse_var(&lookup, "AKARI_MIN_SIGNAL_DENSITY", "40")?;
    let max_farm_risk = parse_var(&lookup, "AKARI_MAX_FARM_RISK", "30")?;
    let min_akari_score = parse_var(&lookup, "AKARI_MIN_AKARI_SCORE", "50")?;

    let engine_cron = or_default("AKARI_ENGINE_CRON", "0 0 3 * * *");
    let engine_run_timeout_mins: i64 = parse_var(&lookup, "AKARI_ENGINE_RUN_TIMEOUT_MINS", "360")?;
    if engine_run_timeout_mins <= 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "AKARI_ENGINE_RUN_TIMEOUT_MINS".to_string(),
            reason: "must be positive".to_string(),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        projects_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        social_base_url,
        social_api_key,
        scoring_url,
        scoring_api_key,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        inter_call_delay_ms,
        rescore_batch_size,
        rescore_stale_days,
        global_circle_max,
        follower_sample_size,
        mention_sample_size,
        quality_follower_min,
        min_authenticity,
        min_signal_density,
        max_farm_risk,
        min_akari_score,
        engine_cron,
        engine_run_timeout_mins,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "AKARI_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
