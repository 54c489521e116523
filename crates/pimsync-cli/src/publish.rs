//! The `publish` command: mint a SKU and push a brand-new product.

use std::path::PathBuf;

use clap::Args;

use pimsync_engine::{publish_product, Engine, NewProduct, SyncOutcome};

use crate::resolve_sites;

#[derive(Debug, Args)]
pub struct PublishArgs {
    /// YAML or JSON file describing the product (name, sale_price,
    /// attributes, categories, images, ...)
    file: PathBuf,

    /// Comma-separated site keys (default: all configured sites)
    #[arg(long)]
    sites: Option<String>,
}

pub async fn run(engine: &Engine, args: PublishArgs) -> anyhow::Result<()> {
    let sites = resolve_sites(engine, args.sites.as_deref())?;
    let raw = std::fs::read_to_string(&args.file)?;
    let draft: NewProduct = serde_yaml::from_str(&raw)?;
    if draft.name.is_empty() {
        anyhow::bail!("product file has no name");
    }

    let report = publish_product(engine, &draft, &sites).await?;
    println!("published as {}", report.sku);

    let mut failed = false;
    for result in report.results {
        match result.outcome {
            SyncOutcome::Created { remote_id } => {
                println!("{}: created (remote id {remote_id})", result.site);
            }
            SyncOutcome::Updated { remote_id } | SyncOutcome::Skipped { remote_id } => {
                println!("{}: written (remote id {remote_id})", result.site);
            }
            SyncOutcome::Failed { message, .. } => {
                failed = true;
                println!("{}: FAILED: {message}", result.site);
            }
        }
    }
    if failed {
        anyhow::bail!(
            "publish finished with site failures; retry with `pimsync sync {}`",
            report.sku
        );
    }
    Ok(())
}
