//! PTV client configuration

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::PtvError;

/// Environment variable holding the developer identifier
pub const ENV_DEVELOPER_ID: &str = "PTV_DEVID";
/// Environment variable holding the security key
pub const ENV_SECURITY_KEY: &str = "PTV_SECRET";
/// Environment variable overriding the base URL
pub const ENV_BASE_URL: &str = "PTV_BASE_URL";

/// Configuration for the PTV timetable API client
#[derive(Clone, Serialize, Deserialize)]
pub struct PtvConfig {
    /// Base URL the relative request paths are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Developer identifier, sent as `devid` with every request
    pub developer_id: String,

    /// Security key used as the HMAC key (sensitive - never transmitted)
    #[serde(skip_serializing)]
    pub security_key: SecretString,

    /// Transport timeout in seconds (`None` leaves the transport default)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://timetableapi.ptv.vic.gov.au".to_string()
}

fn default_user_agent() -> String {
    format!("integration_ptv/{}", env!("CARGO_PKG_VERSION"))
}

impl std::fmt::Debug for PtvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtvConfig")
            .field("base_url", &self.base_url)
            .field("developer_id", &self.developer_id)
            .field("security_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl PtvConfig {
    /// Create a configuration for the production API with the given credentials
    pub fn new(developer_id: impl Into<String>, security_key: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            developer_id: developer_id.into(),
            security_key: SecretString::from(security_key.into()),
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }

    /// Load credentials from `PTV_DEVID` and `PTV_SECRET`
    ///
    /// `PTV_BASE_URL` overrides the base URL when set.
    ///
    /// # Errors
    ///
    /// Returns an error if either credential variable is missing.
    pub fn from_env() -> Result<Self, PtvError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PtvError> {
        let require = |name: &str| {
            lookup(name).ok_or_else(|| {
                PtvError::ConfigurationError(format!("Missing environment variable: {name}"))
            })
        };

        let config = Self::new(require(ENV_DEVELOPER_ID)?, require(ENV_SECURITY_KEY)?);
        Ok(match lookup(ENV_BASE_URL) {
            Some(base_url) if !base_url.is_empty() => config.with_base_url(base_url),
            _ => config,
        })
    }

    /// Override the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set a transport timeout
    #[must_use]
    pub const fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Parse the configured base URL
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute http(s) URL.
    pub fn parsed_base_url(&self) -> Result<Url, PtvError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| PtvError::ConfigurationError(format!("base_url: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PtvError::ConfigurationError(format!(
                "base_url must use http or https, got {}",
                url.scheme()
            )));
        }
        Ok(url)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), PtvError> {
        if self.developer_id.trim().is_empty() {
            return Err(PtvError::ConfigurationError(
                "developer_id must not be empty".to_string(),
            ));
        }

        if self.security_key.expose_secret().is_empty() {
            return Err(PtvError::ConfigurationError(
                "security_key must not be empty".to_string(),
            ));
        }

        if self.timeout_secs == Some(0) {
            return Err(PtvError::ConfigurationError(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        self.parsed_base_url().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_from_lookup() {
        let config =
            PtvConfig::from_lookup(lookup_in(&[(ENV_DEVELOPER_ID, "2"), (ENV_SECURITY_KEY, "secret")]))
                .unwrap();
        assert_eq!(config.developer_id, "2");
        assert_eq!(config.security_key.expose_secret(), "secret");
        assert_eq!(config.base_url, "http://timetableapi.ptv.vic.gov.au");
    }

    #[test]
    fn test_from_lookup_base_url_override() {
        let config = PtvConfig::from_lookup(lookup_in(&[
            (ENV_DEVELOPER_ID, "2"),
            (ENV_SECURITY_KEY, "secret"),
            (ENV_BASE_URL, "http://localhost:8080"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");

        let config = PtvConfig::from_lookup(lookup_in(&[
            (ENV_DEVELOPER_ID, "2"),
            (ENV_SECURITY_KEY, "secret"),
            (ENV_BASE_URL, ""),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://timetableapi.ptv.vic.gov.au");
    }

    #[test]
    fn test_from_lookup_missing_variable() {
        let err = PtvConfig::from_lookup(lookup_in(&[(ENV_DEVELOPER_ID, "2")])).unwrap_err();
        assert!(matches!(err, PtvError::ConfigurationError(_)));
        assert!(err.to_string().contains(ENV_SECURITY_KEY));

        let err = PtvConfig::from_lookup(lookup_in(&[])).unwrap_err();
        assert!(err.to_string().contains(ENV_DEVELOPER_ID));
    }

    #[test]
    fn test_from_env_reads_process_environment() {
        let expected = PtvConfig::from_lookup(|name| std::env::var(name).ok());
        let actual = PtvConfig::from_env();
        assert_eq!(expected.is_ok(), actual.is_ok());
    }

    #[test]
    fn test_new_config() {
        let config = PtvConfig::new("2", "secret");
        assert_eq!(config.base_url, "http://timetableapi.ptv.vic.gov.au");
        assert_eq!(config.developer_id, "2");
        assert_eq!(config.security_key.expose_secret(), "secret");
        assert!(config.timeout_secs.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = PtvConfig::new("2", "super_secret_key");
        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("super_secret_key"));
    }

    #[test]
    fn test_validation_empty_developer_id() {
        assert!(PtvConfig::new(" ", "secret").validate().is_err());
    }

    #[test]
    fn test_validation_empty_key() {
        assert!(PtvConfig::new("2", "").validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let config = PtvConfig::new("2", "secret").with_timeout_secs(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_base_url() {
        let config = PtvConfig::new("2", "secret").with_base_url("not a url");
        assert!(config.validate().is_err());

        let config = PtvConfig::new("2", "secret").with_base_url("ftp://example.com");
        assert!(config.validate().is_err());

        let config = PtvConfig::new("2", "secret").with_base_url("https://example.com/api");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{ "developer_id": "2", "security_key": "secret" }"#;
        let config: PtvConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.base_url, "http://timetableapi.ptv.vic.gov.au");
        assert_eq!(config.security_key.expose_secret(), "secret");
        assert!(config.user_agent.starts_with("integration_ptv/"));
    }

    #[test]
    fn test_serialize_skips_key() {
        let config = PtvConfig::new("2", "super_secret_key");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("developer_id"));
        assert!(!json.contains("super_secret_key"));
        assert!(!json.contains("security_key"));
    }
}
