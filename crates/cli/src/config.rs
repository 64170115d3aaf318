//! Process configuration, read once from the environment at startup.

use std::time::Duration;

use scanbridge_reconcile::{ReconcileSettings, RetryPolicy};
use scanbridge_tracker::{TrackerConfig, DEFAULT_AUTH_SCHEME, DEFAULT_REQUEST_TIMEOUT};

/// Environment variables, each with the legacy camelCase alias the webhook
/// deployment manifests already set.
const URL_VARS: &[&str] = &["SECHUB_URL", "sechubURL"];
const TOKEN_VARS: &[&str] = &["SECHUB_TOKEN", "sechubToken"];
const PRODUCT_VARS: &[&str] = &["SECHUB_PRODUCT", "product"];
const PRODUCT_NAME_VARS: &[&str] = &["SECHUB_PRODUCT_NAME", "productName"];
const AUTH_SCHEME_VAR: &str = "SECHUB_AUTH_SCHEME";
const TIMEOUT_VAR: &str = "SECHUB_TIMEOUT_SECS";
const RECHECK_ATTEMPTS_VAR: &str = "SECHUB_RECHECK_ATTEMPTS";
const RECHECK_DELAY_VAR: &str = "SECHUB_RECHECK_DELAY_MS";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} environment variable is not set")]
    Missing { var: &'static str },

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the service needs, built once and passed down.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub tracker: TrackerConfig,
    pub reconcile: ReconcileSettings,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let first = |keys: &'static [&'static str]| -> Result<String, ConfigError> {
            keys.iter()
                .find_map(|k| get(*k))
                .ok_or(ConfigError::Missing { var: keys[0] })
        };

        let base_url = first(URL_VARS)?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: URL_VARS[0],
                value: base_url,
                reason: "expected an http:// or https:// URL".to_string(),
            });
        }
        let token = first(TOKEN_VARS)?;
        let product_id: u64 = parse(PRODUCT_VARS[0], &first(PRODUCT_VARS)?)?;
        let product_name = first(PRODUCT_NAME_VARS)?;

        let auth_scheme = get(AUTH_SCHEME_VAR).unwrap_or_else(|| DEFAULT_AUTH_SCHEME.to_string());
        let timeout = match get(TIMEOUT_VAR) {
            Some(v) => Duration::from_secs(parse(TIMEOUT_VAR, &v)?),
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let mut recheck = RetryPolicy::default();
        if let Some(v) = get(RECHECK_ATTEMPTS_VAR) {
            recheck.max_attempts = parse(RECHECK_ATTEMPTS_VAR, &v)?;
        }
        if let Some(v) = get(RECHECK_DELAY_VAR) {
            recheck.initial_delay = Duration::from_millis(parse(RECHECK_DELAY_VAR, &v)?);
            recheck.max_delay = recheck.max_delay.max(recheck.initial_delay);
        }

        Ok(Self {
            tracker: TrackerConfig::new(&base_url, &token)
                .with_auth_scheme(&auth_scheme)
                .with_request_timeout(timeout),
            reconcile: ReconcileSettings {
                product_id,
                product_name,
                recheck,
            },
        })
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
