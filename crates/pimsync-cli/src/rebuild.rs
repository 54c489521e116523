//! The `rebuild-variations` command: destroy and recreate a size run.

use clap::Args;

use pimsync_engine::{rebuild_variations, Engine};

use crate::resolve_sites;

#[derive(Debug, Args)]
pub struct RebuildArgs {
    /// SKU whose variations should be rebuilt
    sku: String,

    /// Comma-separated site keys (default: all configured sites)
    #[arg(long)]
    sites: Option<String>,
}

pub async fn run(engine: &Engine, args: RebuildArgs) -> anyhow::Result<()> {
    let sites = resolve_sites(engine, args.sites.as_deref())?;
    let reports = rebuild_variations(engine, &args.sku, &sites).await?;
    let mut failed = 0;
    for report in reports {
        match report.error {
            Some(error) => {
                failed += 1;
                println!("{}: FAILED ({error})", report.site);
            }
            None => println!(
                "{}: deleted {} variation(s), created {}",
                report.site, report.deleted, report.created
            ),
        }
    }
    if failed > 0 {
        anyhow::bail!("rebuild failed on {failed} site(s)");
    }
    Ok(())
}
