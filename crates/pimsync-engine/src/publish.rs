//! Publishing a brand-new product.
//!
//! The SKU is derived from the product's attributes plus a random suffix and
//! is claimed atomically in the canonical store before any storefront sees
//! it. A local collision means the random suffix is re-rolled, never merged
//! into the colliding record.

use rand::distr::Alphanumeric;
use rand::Rng;

use pimsync_core::{FieldSelection, LocalizedContent, ProductAttributes, SiteKey, SyncStatus};
use pimsync_db::{create_product_if_absent, ProductPatch};

use crate::error::EngineError;
use crate::product::NewProduct;
use crate::results::PublishReport;
use crate::sync::sync_product;
use crate::Engine;

const SKU_SUFFIX_LEN: usize = 5;
const SKU_CLAIM_ATTEMPTS: u32 = 5;

/// Derives a SKU of the form `{TEAM}-{SEASON}-{TYPE}-{SUFFIX}`, e.g.
/// `RM-2425-HOM-A3X7K`: team initials, season digits, the first three
/// letters of the product type, and a random alphanumeric suffix.
pub fn derive_sku<R: Rng>(attrs: &ProductAttributes, rng: &mut R) -> String {
    let team = initials(attrs.team.as_deref().unwrap_or_default());
    let season = digits(attrs.season.as_deref().unwrap_or_default());
    let kind = type_code(attrs.kind.as_deref().unwrap_or_default());
    let suffix: String = (0..SKU_SUFFIX_LEN)
        .map(|_| (rng.sample(Alphanumeric) as char).to_ascii_uppercase())
        .collect();
    format!("{team}-{season}-{kind}-{suffix}")
}

/// First letter of each word, uppercased. `"Real Madrid"` becomes `"RM"`.
fn initials(value: &str) -> String {
    let initials: String = value
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if initials.is_empty() {
        "X".to_owned()
    } else {
        initials
    }
}

/// Digits only. `"24/25"` becomes `"2425"`.
fn digits(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        "0".to_owned()
    } else {
        digits
    }
}

/// First three letters, uppercased. `"Home"` becomes `"HOM"`.
fn type_code(value: &str) -> String {
    let code: String = value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if code.is_empty() {
        "GEN".to_owned()
    } else {
        code
    }
}

fn patch_for_draft(sku: &str, draft: &NewProduct, sites: &[SiteKey]) -> ProductPatch {
    let mut patch = ProductPatch::for_sku(sku);
    patch.name = Some(draft.name.clone());
    patch.images = Some(draft.images.clone());
    patch.categories = Some(draft.categories.clone());
    patch.attributes = Some(draft.attributes.clone());

    let content = LocalizedContent {
        name: draft.name.clone(),
        description: draft.description.clone(),
        short_description: draft.short_description.clone(),
    };
    let status = if draft.status.is_empty() {
        "publish".to_owned()
    } else {
        draft.status.clone()
    };
    for site in sites {
        patch.prices.insert(site.clone(), draft.sale_price);
        if let Some(quantity) = draft.stock_quantity {
            patch.stock_quantities.insert(site.clone(), quantity);
        }
        patch
            .stock_statuses
            .insert(site.clone(), "instock".to_owned());
        patch.statuses.insert(site.clone(), status.clone());
        patch.content.insert(site.clone(), content.clone());
        patch.sync_status.insert(site.clone(), SyncStatus::Pending);
    }
    patch
}

/// Publishes a new product: claims a derived SKU locally, then syncs the
/// record (including images) to every target site.
///
/// # Errors
///
/// Returns [`EngineError::SkuExhausted`] when no free SKU can be derived,
/// or the usual sync-time errors. Per-site push failures land in the report.
pub async fn publish_product(
    engine: &Engine,
    draft: &NewProduct,
    sites: &[SiteKey],
) -> Result<PublishReport, EngineError> {
    let mut sku = None;
    for _ in 0..SKU_CLAIM_ATTEMPTS {
        let candidate = derive_sku(&draft.attributes, &mut rand::rng());
        let patch = patch_for_draft(&candidate, draft, sites);
        if create_product_if_absent(engine.pool(), &patch).await? {
            sku = Some(candidate);
            break;
        }
        tracing::warn!(sku = %candidate, "derived sku already taken; re-rolling");
    }
    let Some(sku) = sku else {
        return Err(EngineError::SkuExhausted {
            attempts: SKU_CLAIM_ATTEMPTS,
        });
    };

    tracing::info!(sku = %sku, sites = sites.len(), "publishing new product");
    let results = sync_product(engine, &sku, sites, FieldSelection::all()).await?;
    Ok(PublishReport { sku, results })
}
