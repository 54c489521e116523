//! Size variation management.
//!
//! Variations are derived state: one per size in the gender's size run, never
//! authored by hand. The regular price is always double the sale price, so a
//! permanent "on sale" strike-through renders on the storefront.

use rust_decimal::Decimal;

use pimsync_catalog::types::{
    RemoteProduct, RemoteVariation, VariationAttribute, VariationBatch, VariationPayload,
};
use pimsync_catalog::{CatalogClient, CatalogError, SIZE_ATTRIBUTE};
use pimsync_core::{size_set_for_gender, Variation};

/// Everything needed to derive a product's full variation set on one site.
#[derive(Debug, Clone, Copy)]
pub struct VariationSpec<'a> {
    pub sku: &'a str,
    pub gender: &'a str,
    pub sale_price: Decimal,
    pub stock_quantity: Option<i64>,
    pub stock_status: &'a str,
}

/// The displayed strike-through price: double the sale price.
#[must_use]
pub fn regular_price_for(sale_price: Decimal) -> Decimal {
    sale_price * Decimal::TWO
}

/// One creation payload per size in the gender's size run. Variation SKUs are
/// `{product sku}-{size}`.
#[must_use]
pub fn size_payloads(spec: &VariationSpec<'_>) -> Vec<VariationPayload> {
    let regular = regular_price_for(spec.sale_price).to_string();
    let sale = spec.sale_price.to_string();
    size_set_for_gender(spec.gender)
        .iter()
        .map(|size| VariationPayload {
            sku: Some(format!("{}-{size}", spec.sku)),
            regular_price: Some(regular.clone()),
            sale_price: Some(sale.clone()),
            stock_quantity: spec.stock_quantity,
            stock_status: Some(spec.stock_status.to_owned()),
            attributes: Some(vec![VariationAttribute {
                name: SIZE_ATTRIBUTE.to_owned(),
                option: (*size).to_owned(),
            }]),
            ..VariationPayload::default()
        })
        .collect()
}

/// Canonical record of one remote variation.
#[must_use]
pub fn from_remote(remote: RemoteVariation) -> Variation {
    Variation {
        remote_id: remote.id,
        sku: remote.sku,
        regular_price: remote.regular_price,
        sale_price: remote.sale_price,
        stock_quantity: remote.stock_quantity,
        stock_status: remote.stock_status,
        attribute_options: remote
            .attributes
            .into_iter()
            .map(|a| (a.name, a.option))
            .collect(),
    }
}

/// Batch-creates the full size run on an already-variable product.
///
/// # Errors
///
/// Propagates [`CatalogError`] from the batch call.
pub async fn batch_create(
    client: &CatalogClient,
    product_id: i64,
    spec: &VariationSpec<'_>,
) -> Result<Vec<Variation>, CatalogError> {
    let batch = VariationBatch {
        create: size_payloads(spec),
        ..VariationBatch::default()
    };
    let response = client.batch_variations(product_id, &batch).await?;
    Ok(response.create.into_iter().map(from_remote).collect())
}

/// Brings a product's variations in line with its current price.
///
/// - A simple product is converted to variable, then the size run is created.
/// - A variable product with no variations gets the size run created.
/// - Existing variations are updated in place, by remote id, in one batch.
///
/// # Errors
///
/// Propagates [`CatalogError`] from any remote call.
pub async fn ensure_priced(
    client: &CatalogClient,
    remote: &RemoteProduct,
    spec: &VariationSpec<'_>,
) -> Result<Vec<Variation>, CatalogError> {
    if !remote.is_variable() {
        tracing::info!(
            site = %client.site(),
            product_id = remote.id,
            sku = spec.sku,
            "converting simple product to variable"
        );
        client
            .convert_to_variable(remote.id, size_set_for_gender(spec.gender))
            .await?;
        return batch_create(client, remote.id, spec).await;
    }

    let existing = client.list_variations(remote.id).await?;
    if existing.is_empty() {
        return batch_create(client, remote.id, spec).await;
    }

    let regular = regular_price_for(spec.sale_price).to_string();
    let sale = spec.sale_price.to_string();
    let batch = VariationBatch {
        update: existing
            .iter()
            .map(|v| VariationPayload {
                id: Some(v.id),
                regular_price: Some(regular.clone()),
                sale_price: Some(sale.clone()),
                stock_quantity: spec.stock_quantity,
                stock_status: Some(spec.stock_status.to_owned()),
                ..VariationPayload::default()
            })
            .collect(),
        ..VariationBatch::default()
    };
    let response = client.batch_variations(remote.id, &batch).await?;
    Ok(response.update.into_iter().map(from_remote).collect())
}

/// Destroys and recreates the full size run. The repair path for drifted or
/// hand-edited variations; everything derived is rebuilt from the canonical
/// price and gender.
///
/// Returns `(deleted, created)` variations.
///
/// # Errors
///
/// Propagates [`CatalogError`] from any remote call.
pub async fn rebuild(
    client: &CatalogClient,
    remote: &RemoteProduct,
    spec: &VariationSpec<'_>,
) -> Result<(usize, Vec<Variation>), CatalogError> {
    let existing = client.list_variations(remote.id).await?;
    let deleted = existing.len();
    if deleted > 0 {
        let batch = VariationBatch {
            delete: existing.iter().map(|v| v.id).collect(),
            ..VariationBatch::default()
        };
        client.batch_variations(remote.id, &batch).await?;
    }

    if !remote.is_variable() {
        client
            .convert_to_variable(remote.id, size_set_for_gender(spec.gender))
            .await?;
    }

    let created = batch_create(client, remote.id, spec).await?;
    Ok((deleted, created))
}

#[cfg(test)]
mod payload_tests {
    use super::*;

    #[test]
    fn home_shirt_gets_five_adult_sizes_at_double_regular_price() {
        let spec = VariationSpec {
            sku: "RM-2425-HOM-A3X7K",
            gender: "Men's",
            sale_price: Decimal::new(2999, 2),
            stock_quantity: Some(100),
            stock_status: "instock",
        };
        let payloads = size_payloads(&spec);

        let skus: Vec<_> = payloads.iter().map(|p| p.sku.clone().unwrap()).collect();
        assert_eq!(
            skus,
            vec![
                "RM-2425-HOM-A3X7K-S",
                "RM-2425-HOM-A3X7K-M",
                "RM-2425-HOM-A3X7K-L",
                "RM-2425-HOM-A3X7K-XL",
                "RM-2425-HOM-A3X7K-2XL",
            ]
        );
        for payload in &payloads {
            assert_eq!(payload.regular_price.as_deref(), Some("59.98"));
            assert_eq!(payload.sale_price.as_deref(), Some("29.99"));
            assert_eq!(payload.stock_quantity, Some(100));
        }
    }

    #[test]
    fn kids_products_get_the_numeric_size_run() {
        let spec = VariationSpec {
            sku: "RM-2425-KID-B8Y2Q",
            gender: "Kids'",
            sale_price: Decimal::new(2499, 2),
            stock_quantity: None,
            stock_status: "instock",
        };
        let payloads = size_payloads(&spec);

        assert_eq!(payloads.len(), 6);
        assert_eq!(payloads[0].sku.as_deref(), Some("RM-2425-KID-B8Y2Q-16"));
        assert_eq!(payloads[5].sku.as_deref(), Some("RM-2425-KID-B8Y2Q-26"));
    }

    #[test]
    fn regular_price_doubles_without_rounding_drift() {
        assert_eq!(
            regular_price_for(Decimal::new(2999, 2)).to_string(),
            "59.98"
        );
        assert_eq!(regular_price_for(Decimal::new(1995, 2)).to_string(), "39.90");
    }

    #[test]
    fn size_attribute_rides_on_every_payload() {
        let spec = VariationSpec {
            sku: "X-1",
            gender: "Men's",
            sale_price: Decimal::ONE,
            stock_quantity: None,
            stock_status: "instock",
        };
        for payload in size_payloads(&spec) {
            let attrs = payload.attributes.unwrap();
            assert_eq!(attrs.len(), 1);
            assert_eq!(attrs[0].name, SIZE_ATTRIBUTE);
        }
    }
}

#[cfg(test)]
#[path = "variations_test.rs"]
mod remote_tests;
