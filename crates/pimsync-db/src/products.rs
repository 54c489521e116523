//! Database operations for the `products` table.
//!
//! One row per canonical SKU. All per-site state (remote ids, prices, stock,
//! statuses, localized content, variations, ledger) lives in JSONB columns
//! keyed by site, merged in SQL on upsert so that a write touching one site
//! never clobbers another site's entries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;

use pimsync_core::{LocalizedContent, ProductAttributes, SiteMap, SyncStatus, Variation};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub sku: String,
    pub name: Option<String>,
    /// Canonical image source URLs, oldest first.
    pub images: Json<Vec<String>>,
    /// Category names; resolved to per-site category ids at push time.
    pub categories: Json<Vec<String>>,
    pub attributes: Json<ProductAttributes>,
    pub remote_ids: Json<SiteMap<i64>>,
    pub prices: Json<SiteMap<Decimal>>,
    pub regular_prices: Json<SiteMap<Decimal>>,
    pub stock_quantities: Json<SiteMap<i64>>,
    pub stock_statuses: Json<SiteMap<String>>,
    pub statuses: Json<SiteMap<String>>,
    pub content: Json<SiteMap<LocalizedContent>>,
    pub sync_status: Json<SiteMap<SyncStatus>>,
    pub variations: Json<SiteMap<Vec<Variation>>>,
    pub variation_counts: Json<SiteMap<i64>>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const PRODUCT_COLUMNS: &str = "sku, name, images, categories, attributes, \
     remote_ids, prices, regular_prices, stock_quantities, stock_statuses, \
     statuses, content, sync_status, variations, variation_counts, \
     last_synced_at, created_at, updated_at";

/// A partial write against one product row.
///
/// Scalar and list fields are `Option`: `None` leaves the stored value alone.
/// Site maps merge key-by-key; an empty map is a no-op for that column.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub sku: String,
    pub name: Option<String>,
    pub images: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub attributes: Option<ProductAttributes>,
    pub remote_ids: SiteMap<i64>,
    pub prices: SiteMap<Decimal>,
    pub regular_prices: SiteMap<Decimal>,
    pub stock_quantities: SiteMap<i64>,
    pub stock_statuses: SiteMap<String>,
    pub statuses: SiteMap<String>,
    pub content: SiteMap<LocalizedContent>,
    pub sync_status: SiteMap<SyncStatus>,
    pub variations: SiteMap<Vec<Variation>>,
    pub variation_counts: SiteMap<i64>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl ProductPatch {
    #[must_use]
    pub fn for_sku(sku: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Fetch one product by SKU.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, sku: &str) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = $1"
    ))
    .bind(sku)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List SKUs in deterministic order, for paging over the whole catalog.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_product_skus(
    pool: &PgPool,
    offset: i64,
    limit: i64,
) -> Result<Vec<String>, DbError> {
    let skus = sqlx::query_scalar::<_, String>(
        "SELECT sku FROM products ORDER BY sku OFFSET $1 LIMIT $2",
    )
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(skus)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

const UPSERT_SQL: &str = "INSERT INTO products \
         (sku, name, images, categories, attributes, \
          remote_ids, prices, regular_prices, stock_quantities, stock_statuses, \
          statuses, content, sync_status, variations, variation_counts, last_synced_at) \
     VALUES ($1, $2, \
             COALESCE($3, '[]'::jsonb), COALESCE($4, '[]'::jsonb), COALESCE($5, '{}'::jsonb), \
             $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
     ON CONFLICT (sku) DO UPDATE SET \
         name             = COALESCE(EXCLUDED.name, products.name), \
         images           = COALESCE($3, products.images), \
         categories       = COALESCE($4, products.categories), \
         attributes       = COALESCE($5, products.attributes), \
         remote_ids       = COALESCE(products.remote_ids, '{}'::jsonb) || EXCLUDED.remote_ids, \
         prices           = COALESCE(products.prices, '{}'::jsonb) || EXCLUDED.prices, \
         regular_prices   = COALESCE(products.regular_prices, '{}'::jsonb) || EXCLUDED.regular_prices, \
         stock_quantities = COALESCE(products.stock_quantities, '{}'::jsonb) || EXCLUDED.stock_quantities, \
         stock_statuses   = COALESCE(products.stock_statuses, '{}'::jsonb) || EXCLUDED.stock_statuses, \
         statuses         = COALESCE(products.statuses, '{}'::jsonb) || EXCLUDED.statuses, \
         content          = COALESCE(products.content, '{}'::jsonb) || EXCLUDED.content, \
         sync_status      = COALESCE(products.sync_status, '{}'::jsonb) || EXCLUDED.sync_status, \
         variations       = COALESCE(products.variations, '{}'::jsonb) || EXCLUDED.variations, \
         variation_counts = COALESCE(products.variation_counts, '{}'::jsonb) || EXCLUDED.variation_counts, \
         last_synced_at   = COALESCE(EXCLUDED.last_synced_at, products.last_synced_at), \
         updated_at       = NOW()";

fn bind_patch<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    patch: &'q ProductPatch,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(&patch.sku)
        .bind(&patch.name)
        .bind(patch.images.as_ref().map(Json))
        .bind(patch.categories.as_ref().map(Json))
        .bind(patch.attributes.as_ref().map(Json))
        .bind(Json(&patch.remote_ids))
        .bind(Json(&patch.prices))
        .bind(Json(&patch.regular_prices))
        .bind(Json(&patch.stock_quantities))
        .bind(Json(&patch.stock_statuses))
        .bind(Json(&patch.statuses))
        .bind(Json(&patch.content))
        .bind(Json(&patch.sync_status))
        .bind(Json(&patch.variations))
        .bind(Json(&patch.variation_counts))
        .bind(patch.last_synced_at)
}

/// Upsert a batch of product patches in a single transaction.
///
/// Conflicts on `sku` merge the per-site JSONB maps with `||` so that
/// concurrent writers targeting different sites never overwrite each other's
/// entries. Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement in the batch fails; the whole
/// batch rolls back.
pub async fn upsert_products_merged(
    pool: &PgPool,
    patches: &[ProductPatch],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    for patch in patches {
        bind_patch(sqlx::query(UPSERT_SQL), patch)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(patches.len())
}

/// Insert a product row only if the SKU is not already taken.
///
/// Returns `true` if the row was created, `false` on collision. Used by the
/// publish path, where a collision means the generated SKU must be rejected
/// rather than merged.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_product_if_absent(
    pool: &PgPool,
    patch: &ProductPatch,
) -> Result<bool, DbError> {
    let insert_only = "INSERT INTO products \
             (sku, name, images, categories, attributes, \
              remote_ids, prices, regular_prices, stock_quantities, stock_statuses, \
              statuses, content, sync_status, variations, variation_counts, last_synced_at) \
         VALUES ($1, $2, \
                 COALESCE($3, '[]'::jsonb), COALESCE($4, '[]'::jsonb), COALESCE($5, '{}'::jsonb), \
                 $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
         ON CONFLICT (sku) DO NOTHING";

    let rows_affected = bind_patch(sqlx::query(insert_only), patch)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(rows_affected > 0)
}

/// Record the remote id a site assigned to this product.
///
/// Merges a single `{site: id}` entry into `remote_ids` without touching any
/// other site's mapping.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when no row matches the SKU, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn link_remote_id(
    pool: &PgPool,
    sku: &str,
    site: &str,
    remote_id: i64,
) -> Result<(), DbError> {
    let rows_affected = sqlx::query(
        "UPDATE products SET \
             remote_ids = COALESCE(remote_ids, '{}'::jsonb) \
                          || jsonb_build_object($2::text, $3::bigint), \
             updated_at = NOW() \
         WHERE sku = $1",
    )
    .bind(sku)
    .bind(site)
    .bind(remote_id)
    .execute(pool)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Write one site's ledger entry for a product.
///
/// `last_synced_at` is advanced only when the new status is
/// [`SyncStatus::Synced`].
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when no row matches the SKU, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_sync_status(
    pool: &PgPool,
    sku: &str,
    site: &str,
    status: SyncStatus,
) -> Result<(), DbError> {
    let rows_affected = sqlx::query(
        "UPDATE products SET \
             sync_status = COALESCE(sync_status, '{}'::jsonb) \
                           || jsonb_build_object($2::text, $3::jsonb), \
             last_synced_at = CASE WHEN $4 THEN NOW() ELSE last_synced_at END, \
             updated_at = NOW() \
         WHERE sku = $1",
    )
    .bind(sku)
    .bind(site)
    .bind(Json(status))
    .bind(status == SyncStatus::Synced)
    .execute(pool)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Delete the canonical row for a SKU.
///
/// Returns `true` if a row existed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_product_row(pool: &PgPool, sku: &str) -> Result<bool, DbError> {
    let rows_affected = sqlx::query("DELETE FROM products WHERE sku = $1")
        .bind(sku)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(rows_affected > 0)
}
