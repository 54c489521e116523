//! Per-site category id resolution with a batch-scoped cache.
//!
//! Category ids differ across storefronts, so the cache key is
//! `(site, lowercased name)`. One cache is shared across a whole batch run
//! and dropped afterwards; nothing survives between runs, which keeps the
//! cache immune to out-of-band category edits.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use pimsync_catalog::types::CategoryRef;
use pimsync_catalog::{CatalogClient, CatalogError};
use pimsync_core::SiteKey;

#[derive(Debug, Default)]
pub struct CategoryCache {
    inner: RwLock<HashMap<(SiteKey, String), i64>>,
    preloaded: RwLock<HashSet<SiteKey>>,
}

impl CategoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Warm the cache with every category the site already has. One paged
    /// listing up front saves a search round-trip per category later.
    ///
    /// Idempotent per site: a site already listed through this cache is not
    /// listed again, so a cache shared by a whole batch pays the listing cost
    /// once per site rather than once per SKU. Two racing preloads may both
    /// list; their inserts are identical.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the listing fails.
    pub async fn preload(&self, client: &CatalogClient) -> Result<usize, CatalogError> {
        if self.preloaded.read().await.contains(client.site()) {
            return Ok(0);
        }
        let categories = client.list_categories().await?;
        let count = categories.len();
        let mut cache = self.inner.write().await;
        for category in categories {
            cache.insert(
                (client.site().clone(), category.name.to_lowercase()),
                category.id,
            );
        }
        drop(cache);
        self.preloaded.write().await.insert(client.site().clone());
        Ok(count)
    }

    /// Resolve one category name to the site's id, creating the category on
    /// the site if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the lookup or creation fails.
    pub async fn resolve(
        &self,
        client: &CatalogClient,
        name: &str,
    ) -> Result<i64, CatalogError> {
        let key = (client.site().clone(), name.to_lowercase());
        if let Some(id) = self.inner.read().await.get(&key) {
            return Ok(*id);
        }

        let category = client.find_or_create_category(name).await?;
        self.inner.write().await.insert(key, category.id);
        Ok(category.id)
    }

    /// Resolve a list of names into the payload shape the API expects,
    /// preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on the first name that fails to resolve.
    pub async fn resolve_all(
        &self,
        client: &CatalogClient,
        names: &[String],
    ) -> Result<Vec<CategoryRef>, CatalogError> {
        let mut refs = Vec::with_capacity(names.len());
        for name in names {
            let id = self.resolve(client, name).await?;
            refs.push(CategoryRef { id });
        }
        Ok(refs)
    }
}

#[cfg(test)]
#[path = "categories_test.rs"]
mod tests;
