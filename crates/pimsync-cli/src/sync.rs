//! The `sync` command: push one or more SKUs to the storefronts.

use clap::Args;

use pimsync_core::FieldSelection;
use pimsync_engine::{sync_many, sync_product, Engine, SyncOutcome};

use crate::resolve_sites;

const SKU_PAGE: i64 = 500;

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// SKUs to sync
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    skus: Vec<String>,

    /// Sync every SKU in the canonical store
    #[arg(long)]
    all: bool,

    /// Comma-separated site keys (default: all configured sites)
    #[arg(long)]
    sites: Option<String>,

    /// Field groups to write: "default", "all", or a comma list
    /// (content,status,stock,price,categories,images)
    #[arg(long, default_value = "default")]
    fields: String,

    /// Shorthand for adding the images group to --fields
    #[arg(long)]
    with_images: bool,
}

pub async fn run(engine: &Engine, args: SyncArgs) -> anyhow::Result<()> {
    let sites = resolve_sites(engine, args.sites.as_deref())?;
    let mut selection: FieldSelection = args
        .fields
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    if args.with_images {
        selection.images = true;
    }

    if args.all {
        return sync_all(engine, &sites, selection).await;
    }

    if args.skus.len() == 1 {
        let results = sync_product(engine, &args.skus[0], &sites, selection).await?;
        let mut failed = false;
        for result in results {
            match result.outcome {
                SyncOutcome::Created { remote_id } => {
                    println!("{}: created (remote id {remote_id})", result.site);
                }
                SyncOutcome::Updated { remote_id } => {
                    println!("{}: updated (remote id {remote_id})", result.site);
                }
                SyncOutcome::Skipped { .. } => println!("{}: already in sync", result.site),
                SyncOutcome::Failed { message, .. } => {
                    failed = true;
                    println!("{}: FAILED: {message}", result.site);
                }
            }
        }
        if failed {
            anyhow::bail!("sync finished with site failures");
        }
        return Ok(());
    }

    let report = sync_many(engine, &args.skus, &sites, selection).await;
    println!(
        "synced {}/{} products ({} failed, {} needed retries)",
        report.succeeded, report.total, report.failed, report.retried
    );
    if report.failed > 0 {
        anyhow::bail!("{} products failed to sync", report.failed);
    }
    Ok(())
}

/// Pages through the canonical store and syncs everything.
async fn sync_all(
    engine: &Engine,
    sites: &[pimsync_core::SiteKey],
    selection: FieldSelection,
) -> anyhow::Result<()> {
    let mut offset = 0i64;
    let mut total = 0usize;
    let mut failed = 0usize;
    loop {
        let skus = pimsync_db::list_product_skus(engine.pool(), offset, SKU_PAGE).await?;
        if skus.is_empty() {
            break;
        }
        let report = sync_many(engine, &skus, sites, selection).await;
        total += report.total;
        failed += report.failed;
        println!(
            "batch done: {}/{} succeeded ({} retried)",
            report.succeeded, report.total, report.retried
        );
        offset += SKU_PAGE;
    }
    println!("synced {}/{total} products", total - failed);
    if failed > 0 {
        anyhow::bail!("{failed} products failed to sync");
    }
    Ok(())
}
