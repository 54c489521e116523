//! Outcome types returned by engine operations.
//!
//! Multi-site operations never fail as a whole because one storefront
//! misbehaved; they return one result per site and let the caller decide
//! what a partial success means.

use pimsync_core::SiteKey;

/// What the reconciler did on one site for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The product did not exist remotely and was created.
    Created { remote_id: i64 },
    /// The product existed and at least one selected field was written.
    Updated { remote_id: i64 },
    /// The product existed and every selected field already matched.
    Skipped { remote_id: i64 },
    /// The push failed; the error is recorded, other sites are unaffected.
    Failed { message: String, transient: bool },
}

impl SyncOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        !matches!(self, SyncOutcome::Failed { .. })
    }

    #[must_use]
    pub fn remote_id(&self) -> Option<i64> {
        match self {
            SyncOutcome::Created { remote_id }
            | SyncOutcome::Updated { remote_id }
            | SyncOutcome::Skipped { remote_id } => Some(*remote_id),
            SyncOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SiteSyncResult {
    pub site: SiteKey,
    pub outcome: SyncOutcome,
}

/// Aggregate of a multi-SKU sync run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// SKUs that needed at least one retry before settling.
    pub retried: usize,
}

/// Result of pulling one SKU from the storefronts.
#[derive(Debug, Clone, Default)]
pub struct PullReport {
    pub sku: String,
    /// Sites where the product was found and merged.
    pub merged_sites: Vec<SiteKey>,
    /// Sites where no product carries the SKU.
    pub missing_sites: Vec<SiteKey>,
}

/// Result of a whole-site pull.
#[derive(Debug, Clone, Default)]
pub struct FullPullReport {
    pub site: SiteKey,
    pub pages: usize,
    pub seen: usize,
    pub written: usize,
    pub skipped_no_sku: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Result of a destructive variation rebuild on one site. A failed site
/// carries the error message; the counts stay zero.
#[derive(Debug, Clone, Default)]
pub struct RebuildReport {
    pub site: SiteKey,
    pub deleted: usize,
    pub created: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PublishReport {
    pub sku: String,
    pub results: Vec<SiteSyncResult>,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteReport {
    pub sku: String,
    pub deleted_sites: Vec<SiteKey>,
    /// Sites with no remote id recorded; nothing to delete.
    pub skipped_sites: Vec<SiteKey>,
    pub failed_sites: Vec<(SiteKey, String)>,
    pub local_row_deleted: bool,
}
