//! Pull-side reconciliation: remote storefront state folded back into the
//! canonical store.
//!
//! Shared fields (name, categories, attributes, images) are owned by the
//! reference site; a pull from any other site only writes that site's own
//! per-site entries. Writes go through the merging upsert, so pulling one
//! site never disturbs another site's columns.

use std::str::FromStr;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;

use pimsync_catalog::types::RemoteProduct;
use pimsync_catalog::CatalogClient;
use pimsync_core::{LocalizedContent, ProductAttributes, SiteKey, SyncStatus, Variation};
use pimsync_db::{
    clear_progress, is_cancelled, upsert_products_merged, upsert_progress, ProductPatch,
    ProgressUpdate,
};

use crate::error::EngineError;
use crate::results::{FullPullReport, PullReport};
use crate::Engine;

/// Builds the canonical patch for one remote product.
///
/// Only the reference site may write shared fields; every site writes its own
/// per-site map entries. The ledger entry is set to `Synced`: a pull means
/// local now equals remote by construction.
#[must_use]
pub fn patch_from_remote(
    site: &SiteKey,
    is_reference: bool,
    remote: &RemoteProduct,
    variations: Vec<Variation>,
) -> ProductPatch {
    let mut patch = ProductPatch::for_sku(remote.sku.clone());

    if is_reference {
        patch.name = Some(remote.name.clone());
        patch.categories = Some(remote.categories.iter().map(|c| c.name.clone()).collect());
        patch.attributes = Some(ProductAttributes::from_remote_pairs(
            &remote.attribute_pairs(),
        ));
        patch.images = Some(remote.images.iter().map(|i| i.src.clone()).collect());
    }

    let sale = pick_price(&remote.sale_price, &remote.price);
    if let Some(sale) = sale {
        patch.prices.insert(site.clone(), sale);
    }
    if let Some(regular) = pick_price(&remote.regular_price, &remote.price) {
        patch.regular_prices.insert(site.clone(), regular);
    }
    if let Some(quantity) = remote.stock_quantity {
        patch.stock_quantities.insert(site.clone(), quantity);
    }
    if !remote.stock_status.is_empty() {
        patch
            .stock_statuses
            .insert(site.clone(), remote.stock_status.clone());
    }
    if !remote.status.is_empty() {
        patch.statuses.insert(site.clone(), remote.status.clone());
    }
    patch.content.insert(
        site.clone(),
        LocalizedContent {
            name: remote.name.clone(),
            description: remote.description.clone(),
            short_description: remote.short_description.clone(),
        },
    );
    patch.remote_ids.insert(site.clone(), remote.id);
    patch.sync_status.insert(site.clone(), SyncStatus::Synced);
    patch
        .variation_counts
        .insert(site.clone(), variations.len() as i64);
    patch.variations.insert(site.clone(), variations);
    patch.last_synced_at = Some(Utc::now());
    patch
}

/// First parseable price wins; blank or malformed falls through to the
/// effective price field.
fn pick_price(preferred: &str, price: &str) -> Option<Decimal> {
    Decimal::from_str(preferred)
        .or_else(|_| Decimal::from_str(price))
        .ok()
}

async fn fetch_variations(
    client: &CatalogClient,
    remote: &RemoteProduct,
) -> Result<Vec<Variation>, EngineError> {
    if !remote.is_variable() {
        return Ok(Vec::new());
    }
    Ok(client
        .list_variations(remote.id)
        .await?
        .into_iter()
        .map(crate::variations::from_remote)
        .collect())
}

/// Pulls one SKU from each of the given sites into the canonical store.
///
/// Sites that do not carry the SKU are reported as missing, not failed.
///
/// # Errors
///
/// Returns [`EngineError`] on a remote error or a failed canonical write.
pub async fn pull_product(
    engine: &Engine,
    sku: &str,
    sites: &[SiteKey],
) -> Result<PullReport, EngineError> {
    let mut report = PullReport {
        sku: sku.to_owned(),
        ..PullReport::default()
    };
    let mut patches = Vec::new();

    for site in sites {
        let client = engine.client(site)?;
        let Some(summary) = client.find_by_sku(sku).await? else {
            report.missing_sites.push(site.clone());
            continue;
        };
        let remote = client.get_product(summary.id).await?;
        let variations = fetch_variations(client, &remote).await?;
        patches.push(patch_from_remote(
            site,
            engine.is_reference(site),
            &remote,
            variations,
        ));
        report.merged_sites.push(site.clone());
    }

    if !patches.is_empty() {
        upsert_products_merged(engine.pool(), &patches).await?;
    }
    Ok(report)
}

/// Pulls a site's entire catalog into the canonical store.
///
/// Pages through the remote catalog, fetches variations with bounded
/// concurrency, writes in batches, and reports progress through the
/// `sync_progress` row. The cancellation flag is polled between batches;
/// a cancelled pull keeps everything already written.
///
/// # Errors
///
/// Returns [`EngineError`] on a page-level remote error or a failed
/// canonical write. Per-product variation fetch failures are counted and
/// skipped.
pub async fn pull_site_full(engine: &Engine, site: &SiteKey) -> Result<FullPullReport, EngineError> {
    let client = engine.client(site)?;
    let is_reference = engine.is_reference(site);
    let batch_size = engine.options().batch_write_size.max(1);
    let workers = engine.options().max_workers.max(1);

    let mut report = FullPullReport {
        site: site.clone(),
        ..FullPullReport::default()
    };
    // A stale cancel flag from an earlier run must not kill this one.
    clear_progress(engine.pool()).await?;
    let mut buffer: Vec<ProductPatch> = Vec::with_capacity(batch_size);
    let mut page = 1usize;

    loop {
        if page > client.max_pages() {
            tracing::warn!(site = %site, page, "page cap reached; stopping pull");
            break;
        }
        let products = client.list_products_page(page).await?;
        let short_page = products.len() < client.page_size() as usize;
        report.pages += 1;
        report.seen += products.len();

        let with_variations: Vec<(RemoteProduct, Result<Vec<Variation>, EngineError>)> =
            stream::iter(products.into_iter().map(|remote| async move {
                let variations = fetch_variations(client, &remote).await;
                (remote, variations)
            }))
            .buffer_unordered(workers)
            .collect()
            .await;

        for (remote, variations) in with_variations {
            if remote.sku.is_empty() {
                tracing::warn!(site = %site, remote_id = remote.id, "skipping product without sku");
                report.skipped_no_sku += 1;
                continue;
            }
            match variations {
                Ok(variations) => {
                    buffer.push(patch_from_remote(site, is_reference, &remote, variations));
                }
                Err(error) => {
                    tracing::warn!(site = %site, sku = %remote.sku, %error, "variation fetch failed; skipping product");
                    report.failed += 1;
                }
            }
        }

        while buffer.len() >= batch_size {
            let batch: Vec<ProductPatch> = buffer.drain(..batch_size).collect();
            report.written += upsert_products_merged(engine.pool(), &batch).await?;
            heartbeat(engine, site, &report, "running").await;

            if is_cancelled(engine.pool()).await? {
                tracing::info!(site = %site, written = report.written, "pull cancelled");
                report.cancelled = true;
                heartbeat(engine, site, &report, "cancelled").await;
                return Ok(report);
            }
        }

        if short_page {
            break;
        }
        page += 1;
    }

    if !buffer.is_empty() {
        report.written += upsert_products_merged(engine.pool(), &buffer).await?;
    }
    heartbeat(engine, site, &report, "completed").await;
    Ok(report)
}

/// Progress writes are advisory; failure to record one never aborts a pull.
async fn heartbeat(engine: &Engine, site: &SiteKey, report: &FullPullReport, status: &str) {
    let update = ProgressUpdate {
        site: site.to_string(),
        status: status.to_owned(),
        current: report.written as i64,
        total: report.seen as i64,
        success: report.written as i64,
        failed: report.failed as i64,
        message: None,
    };
    if let Err(error) = upsert_progress(engine.pool(), &update).await {
        tracing::warn!(site = %site, %error, "progress heartbeat failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn remote() -> RemoteProduct {
        serde_json::from_value(json!({
            "id": 42,
            "sku": "RM-2425-HOM-A3X7K",
            "name": "Real Madrid Home Shirt 24/25",
            "type": "variable",
            "status": "publish",
            "price": "29.99",
            "sale_price": "29.99",
            "regular_price": "59.98",
            "stock_quantity": 12,
            "stock_status": "instock",
            "description": "Long copy",
            "short_description": "Short copy",
            "images": [{"id": 1, "src": "https://cdn.example.com/a.jpg"}],
            "categories": [{"id": 7, "name": "Real Madrid"}],
            "attributes": [
                {"name": "Gender/Age", "options": ["Men's"]},
                {"name": "Season", "options": ["24/25"]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn reference_site_writes_shared_fields() {
        let patch = patch_from_remote(&SiteKey::from("com"), true, &remote(), Vec::new());

        assert_eq!(patch.sku, "RM-2425-HOM-A3X7K");
        assert_eq!(patch.name.as_deref(), Some("Real Madrid Home Shirt 24/25"));
        assert_eq!(patch.categories, Some(vec!["Real Madrid".to_owned()]));
        let attrs = patch.attributes.unwrap();
        assert_eq!(attrs.gender.as_deref(), Some("Men's"));
        assert_eq!(attrs.season.as_deref(), Some("24/25"));
        assert_eq!(
            patch.images,
            Some(vec!["https://cdn.example.com/a.jpg".to_owned()])
        );
    }

    #[test]
    fn non_reference_site_leaves_shared_fields_alone() {
        let site = SiteKey::from("uk");
        let patch = patch_from_remote(&site, false, &remote(), Vec::new());

        assert!(patch.name.is_none());
        assert!(patch.categories.is_none());
        assert!(patch.attributes.is_none());
        assert!(patch.images.is_none());
        // The site's own entries are still written.
        assert_eq!(patch.remote_ids.get(&site), Some(&42));
        assert_eq!(patch.prices.get(&site).map(ToString::to_string), Some("29.99".to_owned()));
        assert_eq!(patch.sync_status.get(&site), Some(&SyncStatus::Synced));
    }

    #[test]
    fn falls_back_to_effective_price_when_sale_price_is_blank() {
        let mut product = remote();
        product.sale_price = String::new();
        let site = SiteKey::from("de");
        let patch = patch_from_remote(&site, false, &product, Vec::new());

        assert_eq!(
            patch.prices.get(&site).map(ToString::to_string),
            Some("29.99".to_owned())
        );
    }

    #[test]
    fn falls_back_to_effective_price_when_regular_price_is_blank() {
        let mut product = remote();
        product.regular_price = String::new();
        let site = SiteKey::from("de");
        let patch = patch_from_remote(&site, false, &product, Vec::new());

        assert_eq!(
            patch.regular_prices.get(&site).map(ToString::to_string),
            Some("29.99".to_owned())
        );
    }

    #[test]
    fn variation_count_matches_the_stored_set() {
        let site = SiteKey::from("fr");
        let variations = vec![Variation::default(), Variation::default()];
        let patch = patch_from_remote(&site, false, &remote(), variations);

        assert_eq!(patch.variation_counts.get(&site), Some(&2));
        assert_eq!(patch.variations.get(&site).map(Vec::len), Some(2));
    }
}
