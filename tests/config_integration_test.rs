// Configuration integration tests
//
// Loading YAML from disk and building a handler from it.

use std::io::Write;
use std::sync::Arc;

use fetch_cache::config::LogFormat;
use fetch_cache::{CacheHandler, Config, ConfigError, MemoryCacheStorage, Strategy};

fn write_config(yaml: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_handler_from_yaml_file() {
    let file = write_config(
        r#"
cache_name: "api-cache-v2"
origin: "https://app.example.com"
scope: ["/api/", "/static/"]
default_strategy: cache-first
default_ttl_seconds: 120
default_stale_ttl_seconds: 900
logging:
  level: "fetch_cache=debug"
  format: pretty
"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.default_strategy, Strategy::CacheFirst);
    assert_eq!(config.logging.format, LogFormat::Pretty);

    let handler =
        CacheHandler::with_default_network(config, Arc::new(MemoryCacheStorage::new())).unwrap();
    assert_eq!(handler.config().cache_name, "api-cache-v2");
    assert_eq!(handler.config().max_age_seconds, 7 * 24 * 60 * 60);
}

#[test]
fn test_handler_refuses_invalid_file_config() {
    let file = write_config(
        r#"
origin: "https://app.example.com"
default_ttl_seconds: 600
default_stale_ttl_seconds: 60
"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    let result =
        CacheHandler::with_default_network(config, Arc::new(MemoryCacheStorage::new()));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_printed_config_round_trips_with_defaults() {
    let file = write_config("origin: \"http://localhost:8080\"\n");
    let config = Config::from_file(file.path()).unwrap();

    let rendered = serde_yaml::to_string(&config).unwrap();
    assert!(rendered.contains("cache_name: api-cache-v1"));
    assert_eq!(Config::from_yaml_with_env(&rendered).unwrap(), config);
}
