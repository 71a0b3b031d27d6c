use crate::app_config::AppConfig;
use crate::types::Strategy;
use crate::ConfigError;

pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

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

/// Build application configuration using the provided env-var lookup function,
/// so the parsing rules can be tested against a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        match lookup(var) {
            Ok(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(ConfigError::MissingEnvVar(var.to_string())),
        }
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| invalid(var, e.to_string()))
    };

    let api_key = require("LIGHTHOUSE_API_KEY")?;
    let api_url = or_default("PAGESPEED_API_URL", DEFAULT_API_URL);
    let database_path = PathBuf::from(or_default(
        "PAGESPEED_DATABASE_PATH",
        "./pagespeed_results.db",
    ));
    let targets_path = lookup("PAGESPEED_TARGETS_PATH").ok().map(PathBuf::from);

    let strategy = or_default("PAGESPEED_STRATEGY", "mobile")
        .parse::<Strategy>()
        .map_err(|reason| invalid("PAGESPEED_STRATEGY", reason))?;

    let log_level = or_default("PAGESPEED_LOG_LEVEL", "info");
    let request_timeout_secs = parse_u64("PAGESPEED_REQUEST_TIMEOUT_SECS", "120")?;

    let max_concurrent_requests = match lookup("PAGESPEED_MAX_CONCURRENT_REQUESTS") {
        Ok(raw) => {
            let n = raw
                .parse::<usize>()
                .map_err(|e| invalid("PAGESPEED_MAX_CONCURRENT_REQUESTS", e.to_string()))?;
            if n == 0 {
                return Err(invalid(
                    "PAGESPEED_MAX_CONCURRENT_REQUESTS",
                    "must be at least 1".to_string(),
                ));
            }
            Some(n)
        }
        Err(_) => None,
    };

    let user_agent = or_default("PAGESPEED_USER_AGENT", "pagespeed-batch/0.1");

    Ok(AppConfig {
        api_key,
        api_url,
        database_path,
        targets_path,
        strategy,
        log_level,
        request_timeout_secs,
        max_concurrent_requests,
        user_agent,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
