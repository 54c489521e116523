//! Bounded-concurrency sync of many SKUs.
//!
//! SKUs run through a `buffer_unordered` window sized by the configured
//! worker count. Retry happens at SKU granularity and only for transient
//! failures; a validation error from a storefront settles immediately.

use std::time::Duration;

use futures::stream::{self, StreamExt};

use pimsync_core::{FieldSelection, SiteKey};

use crate::categories::CategoryCache;
use crate::results::{BatchReport, SiteSyncResult, SyncOutcome};
use crate::sync::sync_product_with_cache;
use crate::Engine;

/// Sites whose failure this run is allowed to retry.
fn transient_failures(results: &[SiteSyncResult]) -> Vec<SiteKey> {
    results
        .iter()
        .filter(|r| matches!(r.outcome, SyncOutcome::Failed { transient: true, .. }))
        .map(|r| r.site.clone())
        .collect()
}

fn all_succeeded(results: &[SiteSyncResult]) -> bool {
    results.iter().all(|r| r.outcome.succeeded())
}

/// One SKU's settle loop: sync, then re-sync only the transiently failed
/// sites after a cooldown, up to the configured attempt budget.
async fn settle_sku(
    engine: &Engine,
    sku: &str,
    sites: &[SiteKey],
    selection: FieldSelection,
    categories: &CategoryCache,
) -> (bool, bool) {
    let retry_attempts = engine.options().retry_attempts;
    let cooldown = Duration::from_millis(engine.options().cooldown_after_failure_ms);

    let mut pending: Vec<SiteKey> = sites.to_vec();
    let mut hard_failure = false;
    let mut retried = false;

    for attempt in 0..=retry_attempts {
        let results = match sync_product_with_cache(engine, sku, &pending, selection, categories).await
        {
            Ok(results) => results,
            Err(error) => {
                tracing::warn!(sku, %error, "sku sync failed");
                return (false, retried);
            }
        };

        if !all_succeeded(&results) {
            hard_failure = results.iter().any(
                |r| matches!(r.outcome, SyncOutcome::Failed { transient: false, .. }),
            );
        }
        pending = transient_failures(&results);
        if pending.is_empty() {
            return (!hard_failure, retried);
        }
        if attempt == retry_attempts {
            break;
        }
        retried = true;
        tracing::info!(
            sku,
            attempt = attempt + 1,
            sites = pending.len(),
            "transient failures; cooling down before retry"
        );
        tokio::time::sleep(cooldown).await;
    }
    (false, retried)
}

/// Syncs a list of SKUs to the given sites with bounded concurrency.
///
/// Individual SKU failures are counted, never propagated; the report carries
/// the tallies.
pub async fn sync_many(
    engine: &Engine,
    skus: &[String],
    sites: &[SiteKey],
    selection: FieldSelection,
) -> BatchReport {
    // One category cache for the whole batch: each site's category list is
    // fetched at most once, whatever the SKU count.
    let categories = CategoryCache::new();
    let categories = &categories;
    let outcomes: Vec<(bool, bool)> = stream::iter(skus.iter().map(|sku| async move {
        settle_sku(engine, sku, sites, selection, categories).await
    }))
    .buffer_unordered(engine.options().max_workers.max(1))
    .collect()
    .await;

    let mut report = BatchReport {
        total: skus.len(),
        ..BatchReport::default()
    };
    for (succeeded, retried) in outcomes {
        if succeeded {
            report.succeeded += 1;
        } else {
            report.failed += 1;
        }
        if retried {
            report.retried += 1;
        }
    }
    report
}
