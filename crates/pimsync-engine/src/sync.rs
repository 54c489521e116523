//! Multi-site push orchestration.
//!
//! One product fans out to every requested site concurrently. Sites fail
//! independently: a 500 from one storefront is recorded in that site's ledger
//! entry and the other sites' pushes proceed untouched.

use futures::stream::{self, StreamExt};

use pimsync_catalog::CatalogClient;
use pimsync_core::{FieldSelection, SiteKey, SiteMap, SyncStatus, Variation};
use pimsync_db::{link_remote_id, set_sync_status, upsert_products_merged, ProductPatch};

use crate::categories::CategoryCache;
use crate::error::EngineError;
use crate::product::Product;
use crate::reconciler::{Reconciler, SitePush};
use crate::results::{RebuildReport, SiteSyncResult, SyncOutcome};
use crate::variations::{self, VariationSpec};
use crate::Engine;

/// Pushes one product to each site concurrently, collecting one result per
/// site. Never short-circuits on a site failure.
pub(crate) async fn fan_out(
    targets: Vec<(SiteKey, Reconciler<'_>)>,
    product: &Product,
    selection: FieldSelection,
    max_workers: usize,
) -> Vec<(SiteKey, Result<SitePush, EngineError>)> {
    stream::iter(targets.into_iter().map(|(site, reconciler)| async move {
        let result = reconciler.push(product, selection).await;
        (site, result)
    }))
    .buffer_unordered(max_workers.max(1))
    .collect()
    .await
}

/// Syncs one product to the given sites and records the outcome of every
/// site in the ledger.
///
/// # Errors
///
/// Returns [`EngineError::ProductNotFound`] when the SKU has no canonical
/// row, [`EngineError::UnknownSite`] for a site outside the roster, or
/// [`EngineError::Db`] when a ledger write fails. Per-site push failures do
/// NOT surface as `Err`; they come back as [`SyncOutcome::Failed`] entries.
pub async fn sync_product(
    engine: &Engine,
    sku: &str,
    sites: &[SiteKey],
    selection: FieldSelection,
) -> Result<Vec<SiteSyncResult>, EngineError> {
    sync_product_with_cache(engine, sku, sites, selection, &CategoryCache::new()).await
}

/// Same as [`sync_product`], but sharing a category cache supplied by the
/// caller. A batch passes one cache for the whole run, so each site's
/// category list is fetched once instead of once per SKU.
///
/// # Errors
///
/// See [`sync_product`].
pub async fn sync_product_with_cache(
    engine: &Engine,
    sku: &str,
    sites: &[SiteKey],
    selection: FieldSelection,
    categories: &CategoryCache,
) -> Result<Vec<SiteSyncResult>, EngineError> {
    let row = pimsync_db::get_product(engine.pool(), sku)
        .await?
        .ok_or_else(|| EngineError::ProductNotFound {
            sku: sku.to_owned(),
        })?;
    let product = Product::from(row);

    let mut targets = Vec::with_capacity(sites.len());
    for site in sites {
        let client = engine.client(site)?;
        if selection.categories && !product.categories.is_empty() {
            if let Err(error) = categories.preload(client).await {
                tracing::warn!(site = %site, %error, "category preload failed; falling back to per-name lookups");
            }
        }
        targets.push((
            site.clone(),
            Reconciler {
                client,
                assets: engine.assets(),
                categories,
            },
        ));
    }

    let pushed = fan_out(targets, &product, selection, engine.options().max_workers).await;

    let mut results = Vec::with_capacity(pushed.len());
    for (site, result) in pushed {
        let outcome = match result {
            Ok(push) => {
                record_success(engine, sku, &site, &push).await?;
                push.outcome
            }
            Err(error) => {
                tracing::warn!(site = %site, sku, %error, "site push failed");
                // Best-effort: the ledger write must not mask the push error.
                if let Err(db_error) =
                    set_sync_status(engine.pool(), sku, site.as_str(), SyncStatus::Error).await
                {
                    tracing::error!(site = %site, sku, %db_error, "failed to record error status");
                }
                SyncOutcome::Failed {
                    message: error.to_string(),
                    transient: error.is_transient(),
                }
            }
        };
        results.push(SiteSyncResult { site, outcome });
    }
    Ok(results)
}

async fn record_success(
    engine: &Engine,
    sku: &str,
    site: &SiteKey,
    push: &SitePush,
) -> Result<(), EngineError> {
    if let Some(remote_id) = push.outcome.remote_id() {
        link_remote_id(engine.pool(), sku, site.as_str(), remote_id).await?;
    }
    if let Some(variations) = &push.variations {
        let patch = ProductPatch {
            sku: sku.to_owned(),
            variations: SiteMap::single(site.clone(), variations.clone()),
            variation_counts: SiteMap::single(site.clone(), variations.len() as i64),
            ..ProductPatch::default()
        };
        upsert_products_merged(engine.pool(), &[patch]).await?;
    }
    set_sync_status(engine.pool(), sku, site.as_str(), SyncStatus::Synced).await?;
    Ok(())
}

/// Destroys and recreates the size run for one product on each site, then
/// records the fresh variation set.
///
/// Sites fail independently, as in [`sync_product`]: a failed rebuild lands
/// in that site's report entry with its error message, the site's ledger
/// status flips to error, and the remaining sites proceed. Sites where the
/// product does not exist remotely are skipped with a warning; destroying
/// nothing is not an error.
///
/// # Errors
///
/// Returns [`EngineError::ProductNotFound`] when the SKU has no canonical
/// row, [`EngineError::UnknownSite`] for a site outside the roster, or
/// [`EngineError::Db`] when recording a successful rebuild fails. Per-site
/// rebuild failures do NOT surface as `Err`; they come back in the reports.
pub async fn rebuild_variations(
    engine: &Engine,
    sku: &str,
    sites: &[SiteKey],
) -> Result<Vec<RebuildReport>, EngineError> {
    let row = pimsync_db::get_product(engine.pool(), sku)
        .await?
        .ok_or_else(|| EngineError::ProductNotFound {
            sku: sku.to_owned(),
        })?;
    let product = Product::from(row);
    let gender = product.attributes.gender_or_default().to_owned();

    let mut reports = Vec::new();
    for site in sites {
        let client = engine.client(site)?;

        let (deleted, created) = match rebuild_on_site(client, &product, sku, &gender, site).await
        {
            Ok(Some(rebuilt)) => rebuilt,
            Ok(None) => {
                tracing::warn!(site = %site, sku, "product not on site; skipping rebuild");
                continue;
            }
            Err(error) => {
                tracing::warn!(site = %site, sku, %error, "variation rebuild failed");
                if let Err(db_error) =
                    set_sync_status(engine.pool(), sku, site.as_str(), SyncStatus::Error).await
                {
                    tracing::error!(site = %site, sku, %db_error, "failed to record error status");
                }
                reports.push(RebuildReport {
                    site: site.clone(),
                    error: Some(error.to_string()),
                    ..RebuildReport::default()
                });
                continue;
            }
        };

        let patch = ProductPatch {
            sku: sku.to_owned(),
            variations: SiteMap::single(site.clone(), created.clone()),
            variation_counts: SiteMap::single(site.clone(), created.len() as i64),
            ..ProductPatch::default()
        };
        upsert_products_merged(engine.pool(), &[patch]).await?;
        set_sync_status(engine.pool(), sku, site.as_str(), SyncStatus::Synced).await?;

        reports.push(RebuildReport {
            site: site.clone(),
            deleted,
            created: created.len(),
            error: None,
        });
    }
    Ok(reports)
}

/// One site's share of a rebuild: locate the remote product, derive the size
/// run from the canonical record, and replace the remote variation set.
/// `Ok(None)` means the product does not exist on the site.
async fn rebuild_on_site(
    client: &CatalogClient,
    product: &Product,
    sku: &str,
    gender: &str,
    site: &SiteKey,
) -> Result<Option<(usize, Vec<Variation>)>, EngineError> {
    let remote = match product.remote_ids.get(site) {
        Some(&id) => client.get_product(id).await?,
        None => match client.find_by_sku(sku).await? {
            Some(summary) => client.get_product(summary.id).await?,
            None => return Ok(None),
        },
    };

    let Some(&sale_price) = product.prices.get(site) else {
        return Err(EngineError::DataIntegrity(format!(
            "product '{sku}' has no price for site '{site}'; cannot derive variations"
        )));
    };

    let spec = VariationSpec {
        sku,
        gender,
        sale_price,
        stock_quantity: product.stock_quantities.get(site).copied(),
        stock_status: product
            .stock_statuses
            .get(site)
            .map_or("instock", String::as_str),
    };
    let rebuilt = variations::rebuild(client, &remote, &spec).await?;
    Ok(Some(rebuilt))
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
