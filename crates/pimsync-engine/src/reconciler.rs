//! Push-side reconciliation of one product against one storefront.
//!
//! Two-phase resolution: a product with no recorded remote id is first looked
//! up by SKU, so a product created out of band gets linked instead of
//! duplicated. Updates are diff-based: only selected fields that actually
//! differ from the remote's current state are written, and a fully converged
//! product produces no write at all.

use std::str::FromStr;

use rust_decimal::Decimal;

use pimsync_assets::AssetStore;
use pimsync_catalog::types::{AttributePayload, ProductPayload, RemoteProduct};
use pimsync_catalog::{CatalogClient, CatalogError, SIZE_ATTRIBUTE};
use pimsync_core::{size_set_for_gender, FieldSelection, LocalizedContent, ProductAttributes, Variation};

use crate::categories::CategoryCache;
use crate::error::EngineError;
use crate::media::{self, StagedMedia};
use crate::product::Product;
use crate::results::SyncOutcome;
use crate::variations::{self, VariationSpec};

/// Everything one site push needs. Borrowed, so a fan-out across sites can
/// share the asset store and category cache.
pub struct Reconciler<'a> {
    pub client: &'a CatalogClient,
    pub assets: &'a AssetStore,
    pub categories: &'a CategoryCache,
}

/// A successful push, plus the refreshed variation set when one was touched.
#[derive(Debug)]
pub struct SitePush {
    pub outcome: SyncOutcome,
    pub variations: Option<Vec<Variation>>,
}

impl Reconciler<'_> {
    /// Reconciles `product` onto this site, creating, linking, or updating as
    /// the remote state requires.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the remote rejects a write or a lookup
    /// fails. Failures never leave a half-written canonical record; the
    /// caller records them in the ledger.
    pub async fn push(
        &self,
        product: &Product,
        selection: FieldSelection,
    ) -> Result<SitePush, EngineError> {
        match self.locate(product).await? {
            Some(remote) => self.update(product, &remote, selection).await,
            None => self.create(product, selection).await,
        }
    }

    /// Phase one: find the remote product. A recorded remote id wins; a
    /// missing or stale id falls back to SKU search so out-of-band creations
    /// and deletions both converge.
    async fn locate(&self, product: &Product) -> Result<Option<RemoteProduct>, EngineError> {
        if let Some(&remote_id) = product.remote_ids.get(self.client.site()) {
            match self.client.get_product(remote_id).await {
                Ok(remote) => return Ok(Some(remote)),
                Err(CatalogError::NotFound { .. }) => {
                    tracing::warn!(
                        site = %self.client.site(),
                        sku = %product.sku,
                        remote_id,
                        "linked product no longer exists remotely; re-resolving by sku"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        if let Some(summary) = self.client.find_by_sku(&product.sku).await? {
            tracing::info!(
                site = %self.client.site(),
                sku = %product.sku,
                remote_id = summary.id,
                "linked product found by sku"
            );
            return Ok(Some(self.client.get_product(summary.id).await?));
        }
        Ok(None)
    }

    async fn create(
        &self,
        product: &Product,
        selection: FieldSelection,
    ) -> Result<SitePush, EngineError> {
        let site = self.client.site().clone();
        let staged = if selection.images && !product.images.is_empty() {
            media::stage_images(self.assets, &product.images).await
        } else {
            StagedMedia::default()
        };

        let push = self.create_inner(product, &staged).await?;
        media::purge_staged(self.assets, &staged).await;
        tracing::info!(site = %site, sku = %product.sku, "created product");
        Ok(push)
    }

    async fn create_inner(
        &self,
        product: &Product,
        staged: &StagedMedia,
    ) -> Result<SitePush, EngineError> {
        let site = self.client.site();
        let content = site_content(product, site);
        if content.name.is_empty() {
            return Err(EngineError::DataIntegrity(format!(
                "product '{}' has no name for site '{site}'; cannot create",
                product.sku
            )));
        }
        let sale_price = product.prices.get(site).copied();
        let gender = product.attributes.gender_or_default().to_owned();

        let categories = if product.categories.is_empty() {
            None
        } else {
            Some(
                self.categories
                    .resolve_all(self.client, &product.categories)
                    .await?,
            )
        };

        let payload = ProductPayload {
            sku: Some(product.sku.clone()),
            name: Some(content.name),
            description: Some(content.description),
            short_description: Some(content.short_description),
            product_type: Some(if sale_price.is_some() { "variable" } else { "simple" }.to_owned()),
            status: Some(
                product
                    .statuses
                    .get(site)
                    .cloned()
                    .unwrap_or_else(|| "publish".to_owned()),
            ),
            sale_price: sale_price.map(|p| p.to_string()),
            regular_price: sale_price.map(|p| regular_price(product, site, p).to_string()),
            stock_quantity: product.stock_quantities.get(site).copied(),
            manage_stock: Some(true),
            stock_status: product.stock_statuses.get(site).cloned(),
            categories,
            images: (!staged.images.is_empty()).then(|| staged.images.clone()),
            attributes: Some(attribute_payloads(&product.attributes, &gender)),
        };

        let remote = self.client.create_product(&payload).await?;

        let variations = match sale_price {
            Some(sale) => Some(
                variations::batch_create(
                    self.client,
                    remote.id,
                    &VariationSpec {
                        sku: &product.sku,
                        gender: &gender,
                        sale_price: sale,
                        stock_quantity: product.stock_quantities.get(site).copied(),
                        stock_status: stock_status_or_default(product, site),
                    },
                )
                .await?,
            ),
            None => None,
        };

        Ok(SitePush {
            outcome: SyncOutcome::Created {
                remote_id: remote.id,
            },
            variations,
        })
    }

    async fn update(
        &self,
        product: &Product,
        remote: &RemoteProduct,
        selection: FieldSelection,
    ) -> Result<SitePush, EngineError> {
        let site = self.client.site().clone();
        let mut payload = diff_fields(product, remote, &site, selection);
        let price_changed = selection.price && price_drifted(product, remote, &site);

        if selection.categories && !product.categories.is_empty() {
            let refs = self
                .categories
                .resolve_all(self.client, &product.categories)
                .await?;
            let mut want: Vec<i64> = refs.iter().map(|r| r.id).collect();
            let mut have: Vec<i64> = remote.categories.iter().map(|c| c.id).collect();
            want.sort_unstable();
            have.sort_unstable();
            if want != have {
                payload.categories = Some(refs);
            }
        }

        let staged = if selection.images && !product.images.is_empty() {
            media::request_media_cleanup(self.client, remote.id).await;
            let staged = media::stage_images(self.assets, &product.images).await;
            let have: Vec<&str> = remote.images.iter().map(|i| i.src.as_str()).collect();
            if !staged.images.is_empty() && staged.srcs() != have {
                payload.images = Some(staged.images.clone());
            }
            staged
        } else {
            StagedMedia::default()
        };

        if payload.is_empty() && !price_changed {
            tracing::debug!(site = %site, sku = %product.sku, "already converged; skipping");
            return Ok(SitePush {
                outcome: SyncOutcome::Skipped {
                    remote_id: remote.id,
                },
                variations: None,
            });
        }

        let push = self
            .update_inner(product, remote, payload, price_changed)
            .await?;
        media::purge_staged(self.assets, &staged).await;
        Ok(push)
    }

    async fn update_inner(
        &self,
        product: &Product,
        remote: &RemoteProduct,
        payload: ProductPayload,
        price_changed: bool,
    ) -> Result<SitePush, EngineError> {
        let site = self.client.site().clone();
        if !payload.is_empty() {
            self.client.update_product(remote.id, &payload).await?;
        }

        let variations = if price_changed {
            match product.prices.get(&site).copied() {
                Some(sale) => {
                    let gender = product.attributes.gender_or_default().to_owned();
                    Some(
                        variations::ensure_priced(
                            self.client,
                            remote,
                            &VariationSpec {
                                sku: &product.sku,
                                gender: &gender,
                                sale_price: sale,
                                stock_quantity: product.stock_quantities.get(&site).copied(),
                                stock_status: stock_status_or_default(product, &site),
                            },
                        )
                        .await?,
                    )
                }
                None => None,
            }
        } else {
            None
        };

        tracing::info!(site = %site, sku = %product.sku, remote_id = remote.id, "updated product");
        Ok(SitePush {
            outcome: SyncOutcome::Updated {
                remote_id: remote.id,
            },
            variations,
        })
    }
}

/// The localized copy for a site, falling back to the shared name when the
/// site has none recorded.
fn site_content(product: &Product, site: &pimsync_core::SiteKey) -> LocalizedContent {
    product.content.get(site).cloned().unwrap_or_else(|| {
        LocalizedContent {
            name: product.name.clone().unwrap_or_default(),
            ..LocalizedContent::default()
        }
    })
}

fn stock_status_or_default<'p>(product: &'p Product, site: &pimsync_core::SiteKey) -> &'p str {
    product
        .stock_statuses
        .get(site)
        .map_or("instock", String::as_str)
}

fn regular_price(product: &Product, site: &pimsync_core::SiteKey, sale: Decimal) -> Decimal {
    product
        .regular_prices
        .get(site)
        .copied()
        .unwrap_or_else(|| variations::regular_price_for(sale))
}

/// Pure field diff between the canonical record and one remote product.
/// Only field groups enabled in `selection` are compared; equal values never
/// appear in the payload.
#[must_use]
pub fn diff_fields(
    product: &Product,
    remote: &RemoteProduct,
    site: &pimsync_core::SiteKey,
    selection: FieldSelection,
) -> ProductPayload {
    let mut payload = ProductPayload::default();

    if selection.content {
        let content = site_content(product, site);
        if !content.name.is_empty() && content.name != remote.name {
            payload.name = Some(content.name.clone());
        }
        if !content.description.is_empty() && content.description != remote.description {
            payload.description = Some(content.description.clone());
        }
        if !content.short_description.is_empty()
            && content.short_description != remote.short_description
        {
            payload.short_description = Some(content.short_description.clone());
        }
    }

    if selection.status {
        if let Some(status) = product.statuses.get(site) {
            if status != &remote.status {
                payload.status = Some(status.clone());
            }
        }
    }

    if selection.stock {
        if let Some(&quantity) = product.stock_quantities.get(site) {
            if remote.stock_quantity != Some(quantity) {
                payload.stock_quantity = Some(quantity);
                payload.manage_stock = Some(true);
            }
        }
        if let Some(status) = product.stock_statuses.get(site) {
            if status != &remote.stock_status {
                payload.stock_status = Some(status.clone());
            }
        }
    }

    payload
}

/// Whether the site's sale price differs from the remote's. Prices are never
/// written onto the parent product; drift is reconciled through the variation
/// set instead, where the per-size prices actually live.
#[must_use]
pub fn price_drifted(
    product: &Product,
    remote: &RemoteProduct,
    site: &pimsync_core::SiteKey,
) -> bool {
    product
        .prices
        .get(site)
        .is_some_and(|&sale| !decimal_eq(&remote.sale_price, sale))
}

/// Remote prices arrive as strings; compare numerically so `"29.990"` and
/// `"29.99"` are the same price.
fn decimal_eq(remote: &str, local: Decimal) -> bool {
    Decimal::from_str(remote).is_ok_and(|r| r == local)
}

/// The remote attribute panel for a product: every shared attribute that has
/// a value, plus the size attribute that carries variations.
#[must_use]
pub fn attribute_payloads(attrs: &ProductAttributes, gender: &str) -> Vec<AttributePayload> {
    let mut payloads = Vec::new();
    let mut shared = |name: &str, value: &Option<String>| {
        if let Some(value) = value {
            payloads.push(AttributePayload {
                name: name.to_owned(),
                options: vec![value.clone()],
                variation: false,
                visible: true,
            });
        }
    };
    shared("Team", &attrs.team);
    shared("Season", &attrs.season);
    shared("Type", &attrs.kind);
    shared("Version", &attrs.version);
    shared("Gender", &attrs.gender);
    shared("Sleeve", &attrs.sleeve);
    if !attrs.events.is_empty() {
        payloads.push(AttributePayload {
            name: "Events".to_owned(),
            options: attrs.events.clone(),
            variation: false,
            visible: true,
        });
    }
    payloads.push(AttributePayload {
        name: SIZE_ATTRIBUTE.to_owned(),
        options: size_set_for_gender(gender)
            .iter()
            .map(|s| (*s).to_owned())
            .collect(),
        variation: true,
        visible: true,
    });
    payloads
}

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod tests;
