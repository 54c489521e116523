//! Product deletion across sites.
//!
//! Remote deletions are forced (no trash) and recorded per site in the
//! ledger. The canonical row is only removed when every site with a recorded
//! remote id was deleted cleanly and the caller asked for local removal;
//! staged asset copies go with it.

use pimsync_assets::AssetStore;
use pimsync_catalog::CatalogError;
use pimsync_core::{SiteKey, SyncStatus};
use pimsync_db::{delete_product_row, set_sync_status};

use crate::error::EngineError;
use crate::product::Product;
use crate::results::DeleteReport;
use crate::Engine;

/// Deletes a product from the given sites, and optionally the canonical row.
///
/// Sites without a recorded remote id are skipped. A remote 404 counts as
/// already deleted. Per-site failures are collected, not propagated; a
/// partial failure always preserves the canonical row.
///
/// # Errors
///
/// Returns [`EngineError::ProductNotFound`] when the SKU has no canonical
/// row, or [`EngineError::Db`] when a ledger write fails.
pub async fn delete_product(
    engine: &Engine,
    sku: &str,
    sites: &[SiteKey],
    delete_local: bool,
) -> Result<DeleteReport, EngineError> {
    let row = pimsync_db::get_product(engine.pool(), sku)
        .await?
        .ok_or_else(|| EngineError::ProductNotFound {
            sku: sku.to_owned(),
        })?;
    let product = Product::from(row);

    let mut report = DeleteReport {
        sku: sku.to_owned(),
        ..DeleteReport::default()
    };

    for site in sites {
        let client = engine.client(site)?;
        let Some(&remote_id) = product.remote_ids.get(site) else {
            report.skipped_sites.push(site.clone());
            continue;
        };

        match client.delete_product(remote_id, true).await {
            Ok(_) => {
                set_sync_status(engine.pool(), sku, site.as_str(), SyncStatus::Deleted).await?;
                report.deleted_sites.push(site.clone());
            }
            Err(CatalogError::NotFound { .. }) => {
                tracing::info!(site = %site, sku, remote_id, "already gone remotely");
                set_sync_status(engine.pool(), sku, site.as_str(), SyncStatus::Deleted).await?;
                report.deleted_sites.push(site.clone());
            }
            Err(error) => {
                tracing::warn!(site = %site, sku, %error, "remote delete failed");
                report.failed_sites.push((site.clone(), error.to_string()));
            }
        }
    }

    if delete_local {
        if report.failed_sites.is_empty() {
            discard_assets(engine.assets(), &product.images).await;
            report.local_row_deleted = delete_product_row(engine.pool(), sku).await?;
        } else {
            tracing::warn!(
                sku,
                failed = report.failed_sites.len(),
                "keeping canonical row: not every site delete succeeded"
            );
        }
    }
    Ok(report)
}

/// Best-effort removal of the product's staged asset copies.
async fn discard_assets(store: &AssetStore, sources: &[String]) {
    let paths: Vec<String> = sources
        .iter()
        .map(|src| AssetStore::object_path(src))
        .collect();
    if paths.is_empty() {
        return;
    }
    if let Err(error) = store.delete_objects(&paths).await {
        tracing::warn!(%error, "failed to delete staged assets");
    }
}
