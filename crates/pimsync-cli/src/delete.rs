//! The `delete` command: remove a product from the storefronts.

use clap::Args;

use pimsync_engine::{delete_product, Engine};

use crate::resolve_sites;

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// SKU to delete
    sku: String,

    /// Comma-separated site keys (default: all configured sites)
    #[arg(long)]
    sites: Option<String>,

    /// Also drop the canonical row and its staged images. Only happens
    /// when every remote delete succeeded.
    #[arg(long)]
    delete_local: bool,
}

pub async fn run(engine: &Engine, args: DeleteArgs) -> anyhow::Result<()> {
    let sites = resolve_sites(engine, args.sites.as_deref())?;
    let report = delete_product(engine, &args.sku, &sites, args.delete_local).await?;

    for site in &report.deleted_sites {
        println!("{site}: deleted");
    }
    for site in &report.skipped_sites {
        println!("{site}: no remote id recorded, skipped");
    }
    for (site, message) in &report.failed_sites {
        println!("{site}: FAILED: {message}");
    }
    if report.local_row_deleted {
        println!("canonical row for {} removed", report.sku);
    } else if args.delete_local {
        println!("canonical row kept (not every remote delete succeeded)");
    }
    if !report.failed_sites.is_empty() {
        anyhow::bail!("{} site(s) failed to delete", report.failed_sites.len());
    }
    Ok(())
}
