//! The `pull` command: fold storefront state back into the canonical store.

use clap::Args;

use pimsync_core::SiteKey;
use pimsync_engine::{pull_product, pull_site_full, Engine};

use crate::resolve_sites;

#[derive(Debug, Args)]
pub struct PullArgs {
    /// SKUs to pull from the selected sites
    #[arg(required_unless_present_any = ["all", "cancel"], conflicts_with_all = ["all", "cancel"])]
    skus: Vec<String>,

    /// Pull the entire catalog of one site (requires --site)
    #[arg(long)]
    all: bool,

    /// Site to pull when using --all
    #[arg(long)]
    site: Option<String>,

    /// Comma-separated site keys for per-SKU pulls (default: all)
    #[arg(long)]
    sites: Option<String>,

    /// Ask a running full pull to stop after its current batch
    #[arg(long, conflicts_with = "all")]
    cancel: bool,
}

pub async fn run(engine: &Engine, args: PullArgs) -> anyhow::Result<()> {
    if args.cancel {
        pimsync_db::request_cancel(engine.pool()).await?;
        println!("cancellation requested; the pull stops after its current batch");
        return Ok(());
    }

    if args.all {
        let Some(site) = args.site.as_deref() else {
            anyhow::bail!("--all requires --site <key>");
        };
        let site = SiteKey::from(site);
        if engine.sites().get(&site).is_none() {
            anyhow::bail!("site '{site}' is not in the configured roster");
        }

        let report = pull_site_full(engine, &site).await?;
        println!(
            "pulled {}: {} pages, {} products seen, {} written, {} skipped (no sku), {} failed{}",
            report.site,
            report.pages,
            report.seen,
            report.written,
            report.skipped_no_sku,
            report.failed,
            if report.cancelled { " [cancelled]" } else { "" }
        );
        return Ok(());
    }

    let sites = resolve_sites(engine, args.sites.as_deref())?;
    let mut not_found = 0usize;
    for sku in &args.skus {
        let report = pull_product(engine, sku, &sites).await?;
        for site in &report.merged_sites {
            println!("{sku} {site}: merged");
        }
        for site in &report.missing_sites {
            println!("{sku} {site}: not found");
        }
        if report.merged_sites.is_empty() {
            not_found += 1;
        }
    }
    if not_found > 0 {
        anyhow::bail!("{not_found} sku(s) were not found on any requested site");
    }
    Ok(())
}
