//! Reconciliation engine: pushes canonical product records to the
//! storefronts, pulls remote state back, and keeps the per-site ledger
//! honest.
//!
//! All orchestration is multi-site aware and failure-isolated: one
//! storefront's outage degrades that site's ledger entries, never the run.

use std::collections::BTreeMap;

use sqlx::PgPool;

use pimsync_assets::AssetStore;
use pimsync_catalog::{CatalogClient, ClientOptions};
use pimsync_core::{credentials_from_env, AppConfig, SiteKey, SitesFile};

pub mod batch;
pub mod categories;
pub mod delete;
pub mod error;
pub mod media;
pub mod product;
pub mod puller;
pub mod publish;
pub mod reconciler;
pub mod results;
pub mod sync;
pub mod variations;

#[cfg(test)]
mod test_support;

pub use batch::sync_many;
pub use categories::CategoryCache;
pub use delete::delete_product;
pub use error::EngineError;
pub use product::{NewProduct, Product};
pub use puller::{pull_product, pull_site_full};
pub use publish::{derive_sku, publish_product};
pub use reconciler::Reconciler;
pub use results::{
    BatchReport, DeleteReport, FullPullReport, PublishReport, PullReport, RebuildReport,
    SiteSyncResult, SyncOutcome,
};
pub use sync::{rebuild_variations, sync_product, sync_product_with_cache};

/// Engine-level tunables, normally derived from [`AppConfig`].
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub max_workers: usize,
    /// Extra attempts per SKU after the first, for transient failures only.
    pub retry_attempts: u32,
    pub cooldown_after_failure_ms: u64,
    pub batch_write_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_workers: 10,
            retry_attempts: 2,
            cooldown_after_failure_ms: 2000,
            batch_write_size: 300,
        }
    }
}

impl EngineOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_workers: config.sync_max_workers,
            retry_attempts: config.sync_retry_attempts,
            cooldown_after_failure_ms: config.sync_cooldown_after_failure_ms,
            batch_write_size: config.pull_batch_write_size,
        }
    }
}

/// Shared context for every engine operation: the canonical store, one
/// catalog client per site, and the asset store.
pub struct Engine {
    pool: PgPool,
    sites: SitesFile,
    clients: BTreeMap<SiteKey, CatalogClient>,
    assets: AssetStore,
    options: EngineOptions,
}

impl Engine {
    #[must_use]
    pub fn new(
        pool: PgPool,
        sites: SitesFile,
        clients: BTreeMap<SiteKey, CatalogClient>,
        assets: AssetStore,
        options: EngineOptions,
    ) -> Self {
        Self {
            pool,
            sites,
            clients,
            assets,
            options,
        }
    }

    /// Builds the full engine from the application config: sites roster from
    /// the YAML file, one authenticated client per site, and the asset store.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the roster fails to load, any site is
    /// missing credentials, or the asset store config is invalid.
    pub fn from_app_config(pool: PgPool, config: &AppConfig) -> Result<Self, EngineError> {
        let sites = pimsync_core::load_sites(std::path::Path::new(&config.sites_path))?;
        let client_options = ClientOptions::from_app_config(config);

        let mut clients = BTreeMap::new();
        for entry in &sites.sites {
            let credentials = credentials_from_env(&entry.key);
            let client = CatalogClient::new(entry, credentials, client_options.clone())?;
            clients.insert(entry.key.clone(), client);
        }

        let assets = AssetStore::from_app_config(config)?;
        Ok(Self::new(
            pool,
            sites,
            clients,
            assets,
            EngineOptions::from_app_config(config),
        ))
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[must_use]
    pub fn sites(&self) -> &SitesFile {
        &self.sites
    }

    #[must_use]
    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Every configured site key, roster order.
    #[must_use]
    pub fn all_site_keys(&self) -> Vec<SiteKey> {
        self.sites.keys()
    }

    #[must_use]
    pub fn is_reference(&self, site: &SiteKey) -> bool {
        &self.sites.reference_site().key == site
    }

    /// The catalog client for one site.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownSite`] for a key outside the roster.
    pub fn client(&self, site: &SiteKey) -> Result<&CatalogClient, EngineError> {
        self.clients
            .get(site)
            .ok_or_else(|| EngineError::UnknownSite { site: site.clone() })
    }
}
