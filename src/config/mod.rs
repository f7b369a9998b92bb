// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use url::Url;

use crate::constants::{
    DEFAULT_CACHE_NAME, DEFAULT_LOG_LEVEL, DEFAULT_MAX_AGE_SECONDS, DEFAULT_TTL_SECONDS,
};
use crate::strategy::Strategy;

/// Errors raised while loading or validating configuration.
///
/// A handler is never constructed from a configuration that produced one of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Handler configuration, read once at construction and immutable afterwards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Identifier of the response cache inside the store
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Origin of the serving process (scheme, host, optional port)
    pub origin: String,

    /// Path prefixes eligible for default caching
    #[serde(default)]
    pub scope: Vec<String>,

    #[serde(default)]
    pub default_strategy: Strategy,

    /// TTL applied when the request carries none; 0 disables default caching
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,

    /// Stale window applied when the request carries none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_stale_ttl_seconds: Option<u64>,

    /// Entries older than this are deleted regardless of TTL
    #[serde(default = "default_max_age_seconds")]
    pub max_age_seconds: u64,

    /// Derive invalidation targets from mutating request URLs
    #[serde(default = "default_infer_invalidation")]
    pub infer_invalidation: bool,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_cache_name() -> String {
    DEFAULT_CACHE_NAME.to_string()
}

fn default_ttl_seconds() -> u64 {
    DEFAULT_TTL_SECONDS
}

fn default_max_age_seconds() -> u64 {
    DEFAULT_MAX_AGE_SECONDS
}

fn default_infer_invalidation() -> bool {
    true
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Logging verbosity and format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// EnvFilter directive used when RUST_LOG is not set (e.g. "info", "fetch_cache=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Configuration with every default applied for the given origin
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            cache_name: default_cache_name(),
            origin: origin.into(),
            scope: Vec::new(),
            default_strategy: Strategy::default(),
            default_ttl_seconds: default_ttl_seconds(),
            default_stale_ttl_seconds: None,
            max_age_seconds: default_max_age_seconds(),
            infer_invalidation: default_infer_invalidation(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let mut substituted = String::with_capacity(yaml.len());
        let mut last = 0;
        for caps in re.captures_iter(yaml) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = std::env::var(name.as_str())
                .map_err(|_| ConfigError::MissingEnvVar(name.as_str().to_string()))?;
            substituted.push_str(&yaml[last..whole.start()]);
            substituted.push_str(&value);
            last = whole.end();
        }
        substituted.push_str(&yaml[last..]);

        Ok(serde_yaml::from_str(&substituted)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Parse `origin` into a URL, requiring an absolute http(s) URL with a host
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin).map_err(|e| {
            ConfigError::Invalid(format!("origin '{}' is not a valid URL: {}", self.origin, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "origin '{}' must use http or https",
                self.origin
            )));
        }
        if url.host_str().is_none() {
            return Err(ConfigError::Invalid(format!(
                "origin '{}' has no host",
                self.origin
            )));
        }
        Ok(url)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::Invalid("cache_name cannot be empty".to_string()));
        }

        self.origin_url()?;

        for prefix in &self.scope {
            if !prefix.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "scope prefix '{}' does not start with /",
                    prefix
                )));
            }
        }

        if self.max_age_seconds == 0 {
            return Err(ConfigError::Invalid(
                "max_age_seconds must be greater than 0".to_string(),
            ));
        }

        if let Some(stale) = self.default_stale_ttl_seconds {
            if self.default_ttl_seconds > 0 && stale <= self.default_ttl_seconds {
                return Err(ConfigError::Invalid(format!(
                    "default_stale_ttl_seconds ({}) must be greater than default_ttl_seconds ({})",
                    stale, self.default_ttl_seconds
                )));
            }
        }

        tracing_subscriber::EnvFilter::try_new(&self.logging.level).map_err(|e| {
            ConfigError::Invalid(format!(
                "logging.level '{}' is not a valid filter: {}",
                self.logging.level, e
            ))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_can_parse_minimal_config() {
        let yaml = r#"
origin: https://app.example.com
"#;
        let config = Config::from_yaml_with_env(yaml).unwrap();
        assert_eq!(config.origin, "https://app.example.com");
        assert_eq!(config.cache_name, "api-cache-v1");
        assert!(config.scope.is_empty());
        assert_eq!(config.default_strategy, Strategy::NetworkFirst);
        assert_eq!(config.default_ttl_seconds, 300);
        assert_eq!(config.default_stale_ttl_seconds, None);
        assert_eq!(config.max_age_seconds, 604_800);
        assert!(config.infer_invalidation);
        assert_eq!(config.logging, LoggingConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_can_parse_full_config() {
        let yaml = r#"
cache_name: app-cache-v2
origin: https://app.example.com:8443
scope:
  - /api/
  - /static/
default_strategy: stale-while-revalidate
default_ttl_seconds: 60
default_stale_ttl_seconds: 600
max_age_seconds: 86400
infer_invalidation: false
logging:
  level: debug
  format: pretty
"#;
        let config = Config::from_yaml_with_env(yaml).unwrap();
        assert_eq!(config.cache_name, "app-cache-v2");
        assert_eq!(config.scope, vec!["/api/", "/static/"]);
        assert_eq!(config.default_strategy, Strategy::StaleWhileRevalidate);
        assert_eq!(config.default_stale_ttl_seconds, Some(600));
        assert!(!config.infer_invalidation);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_missing_origin() {
        let result = Config::from_yaml_with_env("cache_name: x\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_rejects_unknown_strategy() {
        let yaml = r#"
origin: https://app.example.com
default_strategy: cache-only
"#;
        assert!(matches!(
            Config::from_yaml_with_env(yaml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_negative_ttl() {
        let yaml = r#"
origin: https://app.example.com
default_ttl_seconds: -5
"#;
        assert!(matches!(
            Config::from_yaml_with_env(yaml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_can_substitute_env_var_in_origin() {
        std::env::set_var("FETCH_CACHE_TEST_ORIGIN", "https://env.example.com");
        let yaml = r#"
origin: ${FETCH_CACHE_TEST_ORIGIN}
"#;
        let config = Config::from_yaml_with_env(yaml).unwrap();
        assert_eq!(config.origin, "https://env.example.com");
        std::env::remove_var("FETCH_CACHE_TEST_ORIGIN");
    }

    #[test]
    fn test_rejects_unset_env_var() {
        let yaml = r#"
origin: ${FETCH_CACHE_TEST_DEFINITELY_UNSET}
"#;
        match Config::from_yaml_with_env(yaml) {
            Err(ConfigError::MissingEnvVar(name)) => {
                assert_eq!(name, "FETCH_CACHE_TEST_DEFINITELY_UNSET")
            }
            other => panic!("expected MissingEnvVar, got {:?}", other),
        }
    }

    #[test]
    fn test_from_file_reads_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "origin: https://file.example.com").unwrap();
        writeln!(file, "scope: [/api/]").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.origin, "https://file.example.com");
        assert_eq!(config.scope, vec!["/api/"]);
    }

    #[test]
    fn test_from_file_reports_missing_file() {
        let result = Config::from_file("/nonexistent/fetch-cache.yaml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_rejects_empty_cache_name() {
        let config = Config {
            cache_name: "  ".to_string(),
            ..Config::new("https://app.example.com")
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cache_name"));
    }

    #[test]
    fn test_rejects_non_http_origin() {
        assert!(Config::new("ftp://app.example.com").validate().is_err());
        assert!(Config::new("not a url").validate().is_err());
        assert!(Config::new("/relative").validate().is_err());
    }

    #[test]
    fn test_rejects_scope_prefix_without_leading_slash() {
        let config = Config {
            scope: vec!["/api/".to_string(), "static/".to_string()],
            ..Config::new("https://app.example.com")
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("static/"));
    }

    #[test]
    fn test_rejects_zero_max_age() {
        let config = Config {
            max_age_seconds: 0,
            ..Config::new("https://app.example.com")
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_stale_ttl_not_exceeding_ttl() {
        let config = Config {
            default_ttl_seconds: 60,
            default_stale_ttl_seconds: Some(60),
            ..Config::new("https://app.example.com")
        };
        assert!(config.validate().is_err());

        let config = Config {
            default_ttl_seconds: 60,
            default_stale_ttl_seconds: Some(61),
            ..Config::new("https://app.example.com")
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_stale_ttl_allowed_when_default_ttl_disabled() {
        let config = Config {
            default_ttl_seconds: 0,
            default_stale_ttl_seconds: Some(30),
            ..Config::new("https://app.example.com")
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_invalid_log_filter() {
        let config = Config {
            logging: LoggingConfig {
                level: "fetch_cache=notalevel".to_string(),
                format: LogFormat::Json,
            },
            ..Config::new("https://app.example.com")
        };
        assert!(config.validate().is_err());
    }
}
