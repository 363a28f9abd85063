//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::session::Language;

/// Default API base URL (the portal backend mounts its routes under `/api`).
pub const DEFAULT_API_URL: &str = "http://localhost:8001/api";

/// Institution used when none is configured; the backend serves demo data for it.
pub const DEFAULT_INSTITUTION: &str = "demo";

/// Booking API client configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the REST API, without trailing slash.
    pub base_url: String,
    /// Institution (tenant) whose portal is being booked.
    pub institution_id: String,
    /// Language used to display program names and descriptions.
    pub language: Language,
    /// Optional bearer token. Public booking endpoints work without it.
    pub api_token: Option<SecretString>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            institution_id: DEFAULT_INSTITUTION.to_string(),
            language: Language::default(),
            api_token: None,
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl GatewayConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("KULTURA_API_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.base_url);
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "KULTURA_API_URL".to_string(),
                message: format!("expected an http(s) URL, got {base_url}"),
            });
        }

        let institution_id = lookup("KULTURA_INSTITUTION_ID")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.institution_id);

        let language = match lookup("KULTURA_LANGUAGE") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "KULTURA_LANGUAGE".to_string(),
                message: format!("expected cs or en, got {raw}"),
            })?,
            None => defaults.language,
        };

        let api_token = lookup("KULTURA_API_TOKEN")
            .filter(|s| !s.trim().is_empty())
            .map(SecretString::from);

        let request_timeout = match lookup("KULTURA_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "KULTURA_HTTP_TIMEOUT_SECS".to_string(),
                    message: format!("expected whole seconds, got {raw}"),
                })?;
                Duration::from_secs(secs.max(1))
            }
            None => defaults.request_timeout,
        };

        Ok(Self {
            base_url,
            institution_id,
            language,
            api_token,
            request_timeout,
        })
    }
}
