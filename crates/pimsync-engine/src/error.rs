use pimsync_assets::AssetError;
use pimsync_catalog::CatalogError;
use pimsync_core::{ConfigError, SiteKey};
use pimsync_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("product '{sku}' not found in canonical store")]
    ProductNotFound { sku: String },

    #[error("site '{site}' is not in the configured roster")]
    UnknownSite { site: SiteKey },

    #[error("could not derive a free SKU after {attempts} attempts")]
    SkuExhausted { attempts: u32 },

    #[error("data integrity: {0}")]
    DataIntegrity(String),
}

impl EngineError {
    /// Whether retrying the same operation could plausibly succeed.
    /// Only transport-level catalog failures qualify.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Catalog(e) if e.is_transient())
    }
}
