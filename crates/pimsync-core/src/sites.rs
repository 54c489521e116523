//! Storefront roster configuration.
//!
//! The site list lives in `config/sites.yaml`; API credentials are deliberately
//! kept out of the file and resolved from the environment per site key
//! (`PIMSYNC_SITE_<KEY>_API_KEY` / `PIMSYNC_SITE_<KEY>_API_SECRET`).

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::SiteKey;
use crate::ConfigError;

/// One storefront entry from `sites.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteEntry {
    pub key: SiteKey,
    pub base_url: String,
    pub currency: String,
    /// Exactly one site is the reference site: authoritative for shared
    /// fields (name, images, categories, attributes) during pulls.
    #[serde(default)]
    pub reference: bool,
}

#[derive(Debug, Deserialize)]
pub struct SitesFile {
    pub sites: Vec<SiteEntry>,
}

impl SitesFile {
    #[must_use]
    pub fn get(&self, key: &SiteKey) -> Option<&SiteEntry> {
        self.sites.iter().find(|s| &s.key == key)
    }

    /// The single site marked `reference: true`. Validation guarantees it exists.
    #[must_use]
    pub fn reference_site(&self) -> &SiteEntry {
        self.sites
            .iter()
            .find(|s| s.reference)
            .unwrap_or(&self.sites[0])
    }

    #[must_use]
    pub fn keys(&self) -> Vec<SiteKey> {
        self.sites.iter().map(|s| s.key.clone()).collect()
    }
}

/// REST API credentials for one storefront.
#[derive(Clone)]
pub struct SiteCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for SiteCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteCredentials")
            .field("api_key", &"[redacted]")
            .field("api_secret", &"[redacted]")
            .finish()
    }
}

/// Load and validate the site roster from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation (empty roster, duplicate keys, not exactly one reference site,
/// non-HTTP base URL).
pub fn load_sites(path: &Path) -> Result<SitesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SitesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let sites_file: SitesFile = serde_yaml::from_str(&content)?;
    validate_sites(&sites_file)?;
    Ok(sites_file)
}

fn validate_sites(sites_file: &SitesFile) -> Result<(), ConfigError> {
    if sites_file.sites.is_empty() {
        return Err(ConfigError::Validation(
            "sites file must declare at least one site".to_string(),
        ));
    }

    let mut seen_keys = HashSet::new();
    let mut reference_count = 0usize;

    for site in &sites_file.sites {
        if site.key.as_str().trim().is_empty() {
            return Err(ConfigError::Validation(
                "site key must be non-empty".to_string(),
            ));
        }
        if !seen_keys.insert(site.key.as_str().to_owned()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site key: '{}'",
                site.key
            )));
        }
        if !site.base_url.starts_with("http://") && !site.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "site '{}' has non-HTTP base_url '{}'",
                site.key, site.base_url
            )));
        }
        if site.reference {
            reference_count += 1;
        }
    }

    if reference_count != 1 {
        return Err(ConfigError::Validation(format!(
            "exactly one site must be marked reference: true (found {reference_count})"
        )));
    }

    Ok(())
}

/// Resolve a site's API credentials from the environment.
///
/// Returns `None` when either variable is missing or empty; the catalog
/// client treats that as a constructor error.
#[must_use]
pub fn credentials_from_env(key: &SiteKey) -> Option<SiteCredentials> {
    credentials_from_lookup(key, |var| std::env::var(var))
}

fn credentials_from_lookup<F>(key: &SiteKey, lookup: F) -> Option<SiteCredentials>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let upper = key.as_str().to_uppercase().replace('-', "_");
    let api_key = lookup(&format!("PIMSYNC_SITE_{upper}_API_KEY")).ok()?;
    let api_secret = lookup(&format!("PIMSYNC_SITE_{upper}_API_SECRET")).ok()?;
    if api_key.is_empty() || api_secret.is_empty() {
        return None;
    }
    Some(SiteCredentials {
        api_key,
        api_secret,
    })
}
