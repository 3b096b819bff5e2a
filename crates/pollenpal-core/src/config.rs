use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid, or if no API
/// keys are configured outside development.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_secs = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        let secs = raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if secs == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(secs)
    };

    let env = parse_environment(&or_default("POLLENPAL_ENV", "development"))?;
    let bind_addr = parse_addr("POLLENPAL_BIND_ADDR", "0.0.0.0:8080")?;
    let log_level = or_default("POLLENPAL_LOG_LEVEL", "info");

    let default_api_url = or_default("POLLENPAL_DEFAULT_API_URL", crate::DEFAULT_API_URL);
    if default_api_url.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "POLLENPAL_DEFAULT_API_URL".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    let scan_interval_secs = parse_secs("POLLENPAL_SCAN_INTERVAL_SECS", "3600")?;
    let request_timeout_secs = parse_secs("POLLENPAL_REQUEST_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("POLLENPAL_USER_AGENT", "pollenpal/0.1 (pollen-sensors)");
    let entries_path = lookup("POLLENPAL_ENTRIES_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let api_keys = parse_api_keys(&lookup("POLLENPAL_API_KEYS").unwrap_or_default());
    if api_keys.is_empty() && env != Environment::Development {
        return Err(ConfigError::MissingEnvVar("POLLENPAL_API_KEYS".to_string()));
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        default_api_url,
        scan_interval_secs,
        request_timeout_secs,
        user_agent,
        entries_path,
        api_keys,
    })
}

/// Comma-separated bearer tokens; blanks are skipped.
fn parse_api_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "POLLENPAL_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
