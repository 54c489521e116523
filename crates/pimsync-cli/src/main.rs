use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pimsync_engine::Engine;

mod delete;
mod orders;
mod publish;
mod pull;
mod rebuild;
mod sync;
mod webhooks;

#[derive(Debug, Parser)]
#[command(name = "pimsync")]
#[command(about = "Multi-site product catalog synchronization")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Push canonical products to the storefronts
    Sync(sync::SyncArgs),
    /// Pull storefront state back into the canonical store
    Pull(pull::PullArgs),
    /// Destroy and recreate a product's size variations
    RebuildVariations(rebuild::RebuildArgs),
    /// Publish a brand-new product under a derived SKU
    Publish(publish::PublishArgs),
    /// Delete a product from the storefronts
    Delete(delete::DeleteArgs),
    /// Inspect and annotate storefront orders
    Orders(orders::OrdersArgs),
    /// Manage storefront webhooks
    Webhooks(webhooks::WebhooksArgs),
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = pimsync_core::load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let pool_config = pimsync_db::PoolConfig {
        max_connections: config.db_max_connections,
        min_connections: config.db_min_connections,
        acquire_timeout_secs: config.db_acquire_timeout_secs,
    };
    let pool = pimsync_db::connect_pool(&config.database_url, pool_config).await?;

    if matches!(cli.command, Commands::Migrate) {
        let applied = pimsync_db::run_migrations(&pool).await?;
        println!("applied {applied} migration(s)");
        return Ok(());
    }

    let engine = Engine::from_app_config(pool, &config)?;
    tracing::debug!(sites = engine.all_site_keys().len(), "engine ready");
    match cli.command {
        Commands::Sync(args) => sync::run(&engine, args).await,
        Commands::Pull(args) => pull::run(&engine, args).await,
        Commands::RebuildVariations(args) => rebuild::run(&engine, args).await,
        Commands::Publish(args) => publish::run(&engine, args).await,
        Commands::Delete(args) => delete::run(&engine, args).await,
        Commands::Orders(args) => orders::run(&engine, args).await,
        Commands::Webhooks(args) => webhooks::run(&engine, args).await,
        Commands::Migrate => unreachable!("handled before engine construction"),
    }
}

/// Parses a `--sites` CSV into roster keys, defaulting to every site.
pub(crate) fn resolve_sites(
    engine: &Engine,
    sites: Option<&str>,
) -> anyhow::Result<Vec<pimsync_core::SiteKey>> {
    let Some(csv) = sites else {
        return Ok(engine.all_site_keys());
    };
    let mut keys = Vec::new();
    for raw in csv.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let key = pimsync_core::SiteKey::from(raw);
        if engine.sites().get(&key).is_none() {
            anyhow::bail!("site '{raw}' is not in the configured roster");
        }
        keys.push(key);
    }
    if keys.is_empty() {
        anyhow::bail!("--sites was given but no site keys were parsed");
    }
    Ok(keys)
}
