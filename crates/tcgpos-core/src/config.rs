use std::str::FromStr;

use chrono_tz::Tz;
use croner::Cron;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a map.
pub(crate) fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let env = parse_environment(&or_default("TCGPOS_ENV", "development"))?;

    let bind_addr = or_default("TCGPOS_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("TCGPOS_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("TCGPOS_LOG_LEVEL", "info");
    let sales_path = PathBuf::from(or_default("TCGPOS_SALES_PATH", "./config/sales.yaml"));

    let timezone = or_default("TCGPOS_TIMEZONE", "Asia/Tokyo")
        .parse::<Tz>()
        .map_err(|e| invalid("TCGPOS_TIMEZONE", e.to_string()))?;

    let status_sweep_cron = or_default("TCGPOS_STATUS_SWEEP_CRON", "0 */10 * * * *");
    let field_count = status_sweep_cron.split_whitespace().count();
    if field_count != 6 {
        return Err(invalid(
            "TCGPOS_STATUS_SWEEP_CRON",
            format!("expected 6 fields (with seconds), found {field_count}"),
        ));
    }
    Cron::from_str(&status_sweep_cron)
        .map_err(|e| invalid("TCGPOS_STATUS_SWEEP_CRON", e.to_string()))?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        sales_path,
        timezone,
        status_sweep_cron,
    })
}

/// Parse a string into an `Environment` variant.
pub(crate) fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TCGPOS_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
