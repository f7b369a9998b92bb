use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use fetch_cache::config::Config;
use fetch_cache::{CacheHandler, MemoryCacheStorage};

/// fetch-cache - validate and inspect a caching interceptor configuration
#[derive(Parser, Debug)]
#[command(name = "fetch-cache")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "fetch-cache.yaml")]
    config: PathBuf,

    /// Print the effective configuration, defaults applied, as YAML
    #[arg(long)]
    print: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    config.validate().context("Invalid configuration")?;

    fetch_cache::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!(
        config_file = %args.config.display(),
        cache = %config.cache_name,
        origin = %config.origin,
        scope = config.scope.len(),
        strategy = %config.default_strategy,
        default_ttl = config.default_ttl_seconds,
        max_age = config.max_age_seconds,
        infer_invalidation = config.infer_invalidation,
        "Configuration loaded successfully"
    );

    // Building a handler runs the same checks a host process would hit
    CacheHandler::with_default_network(config.clone(), Arc::new(MemoryCacheStorage::new()))
        .context("Failed to build cache handler")?;

    if args.print {
        let yaml = serde_yaml::to_string(&config).context("Failed to render configuration")?;
        print!("{}", yaml);
    }

    Ok(())
}
