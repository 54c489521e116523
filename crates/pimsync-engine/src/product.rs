//! In-memory view of one canonical product record.

use rust_decimal::Decimal;
use serde::Deserialize;

use pimsync_core::{LocalizedContent, ProductAttributes, SiteMap, Variation};
use pimsync_db::ProductRow;

/// One canonical product, decoded out of its database row. Site-independent
/// fields are owned by the reference site; everything else is per-site.
#[derive(Debug, Clone, Default)]
pub struct Product {
    pub sku: String,
    pub name: Option<String>,
    pub images: Vec<String>,
    pub categories: Vec<String>,
    pub attributes: ProductAttributes,
    pub remote_ids: SiteMap<i64>,
    pub prices: SiteMap<Decimal>,
    pub regular_prices: SiteMap<Decimal>,
    pub stock_quantities: SiteMap<i64>,
    pub stock_statuses: SiteMap<String>,
    pub statuses: SiteMap<String>,
    pub content: SiteMap<LocalizedContent>,
    pub variations: SiteMap<Vec<Variation>>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            sku: row.sku,
            name: row.name,
            images: row.images.0,
            categories: row.categories.0,
            attributes: row.attributes.0,
            remote_ids: row.remote_ids.0,
            prices: row.prices.0,
            regular_prices: row.regular_prices.0,
            stock_quantities: row.stock_quantities.0,
            stock_statuses: row.stock_statuses.0,
            statuses: row.statuses.0,
            content: row.content.0,
            variations: row.variations.0,
        }
    }
}

/// Input for publishing a brand-new product, usually deserialized from an
/// operator-supplied YAML/JSON file. The SKU is derived, never supplied.
/// `sale_price` is a string in the file (`sale_price: "29.99"`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub attributes: ProductAttributes,
    pub sale_price: Decimal,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    /// Remote publication status, e.g. `"publish"` or `"draft"`.
    #[serde(default)]
    pub status: String,
}
