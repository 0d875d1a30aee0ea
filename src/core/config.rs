use secrecy::{ExposeSecret, Secret};
use serde::{Serialize, Serializer};
use std::env;
use std::time::Duration;

pub const PRODUCTION_BASE_URL: &str = "https://restapi-vimond-prod.b17g.net/";
pub const STAGE_BASE_URL: &str = "https://restapi-vimond-stage.b17g.net/";
pub const DEFAULT_USER_AGENT: &str = concat!("vimond-rs/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Client configuration, fixed once a connector is built.
#[derive(Debug, Clone)]
pub struct VimondConfig {
    pub api_key: Secret<String>,
    pub secret: Secret<String>,
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for VimondConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("VimondConfig", 5)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret", "[REDACTED]")?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("user_agent", &self.user_agent)?;
        state.serialize_field("timeout_secs", &self.timeout.as_secs())?;
        state.end()
    }
}

impl Default for VimondConfig {
    fn default() -> Self {
        Self::unsigned()
    }
}

impl VimondConfig {
    /// Create a new configuration with API credentials
    #[must_use]
    pub fn new(api_key: String, secret: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret: Secret::new(secret),
            base_url: PRODUCTION_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Configuration without credentials; requests are sent unsigned
    #[must_use]
    pub fn unsigned() -> Self {
        Self::new(String::new(), String::new())
    }

    /// Create configuration from environment variables
    ///
    /// Every variable is optional:
    /// - `{PREFIX}_API_KEY` and `{PREFIX}_SECRET`
    /// - `{PREFIX}_BASE_URL`
    /// - `{PREFIX}_USER_AGENT`
    /// - `{PREFIX}_TIMEOUT_SECS`
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let prefix = prefix.to_uppercase();
        let var = |name: &str| env::var(format!("{}_{}", prefix, name)).ok();

        let mut config = Self::new(
            var("API_KEY").unwrap_or_default(),
            var("SECRET").unwrap_or_default(),
        );

        if let Some(base_url) = var("BASE_URL") {
            config.base_url = base_url;
        }

        if let Some(user_agent) = var("USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Some(raw) = var("TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                ConfigError::InvalidConfiguration(format!(
                    "{}_TIMEOUT_SECS must be a whole number of seconds ({}): {}",
                    prefix, raw, e
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Create configuration from a .env file and environment variables
    ///
    /// A missing .env file is not an error; system variables are used as-is.
    #[cfg(feature = "env-file")]
    pub fn from_env_file(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(prefix, ".env")
    }

    /// Create configuration from a specific .env file path
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(prefix: &str, env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(prefix)
    }

    /// Check if this configuration carries credentials for signing
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.secret.expose_secret().is_empty()
    }

    #[must_use]
    pub fn with_credentials(mut self, api_key: String, secret: String) -> Self {
        self.api_key = Secret::new(api_key);
        self.secret = Secret::new(secret);
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Point the configuration at the staging environment
    #[must_use]
    pub fn stage(self) -> Self {
        self.with_base_url(STAGE_BASE_URL.to_string())
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get shared secret (use carefully - exposes secret)
    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VimondConfig::default();

        assert_eq!(config.base_url, PRODUCTION_BASE_URL);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.api_key(), "");
        assert_eq!(config.secret(), "");
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_overrides_are_independent() {
        let config = VimondConfig::unsigned()
            .with_user_agent("user-agent-test".to_string())
            .with_timeout(Duration::from_secs(123));

        assert_eq!(config.user_agent, "user-agent-test");
        assert_eq!(config.timeout, Duration::from_secs(123));
        assert_eq!(config.base_url, PRODUCTION_BASE_URL);

        let config = config.stage();
        assert_eq!(config.base_url, STAGE_BASE_URL);
        assert_eq!(config.user_agent, "user-agent-test");
    }

    #[test]
    fn test_credentials_require_both_parts() {
        assert!(VimondConfig::new("key".to_string(), "secret".to_string()).has_credentials());
        assert!(!VimondConfig::new("key".to_string(), String::new()).has_credentials());
        assert!(!VimondConfig::new(String::new(), "secret".to_string()).has_credentials());
    }

    #[test]
    fn test_serialize_redacts_secrets() {
        let config = VimondConfig::new("test apiKey".to_string(), "test secret".to_string());
        let json = serde_json::to_string(&config).unwrap();

        assert!(!json.contains("test apiKey"));
        assert!(!json.contains("test secret"));
        assert!(json.contains("[REDACTED]"));
    }

    #[test]
    fn test_from_env_reads_prefixed_variables() {
        env::set_var("VIMONDCFGTEST_API_KEY", "env-key");
        env::set_var("VIMONDCFGTEST_SECRET", "env-secret");
        env::set_var("VIMONDCFGTEST_TIMEOUT_SECS", "7");

        let config = VimondConfig::from_env("vimondcfgtest").unwrap();

        assert_eq!(config.api_key(), "env-key");
        assert_eq!(config.secret(), "env-secret");
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert_eq!(config.base_url, PRODUCTION_BASE_URL);
    }

    #[test]
    fn test_from_env_rejects_bad_timeout() {
        env::set_var("VIMONDBADTIMEOUT_TIMEOUT_SECS", "soon");

        let err = VimondConfig::from_env("vimondbadtimeout").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfiguration(_)));
    }
}
