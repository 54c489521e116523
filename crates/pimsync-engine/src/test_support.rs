//! Shared helpers for the engine's wiremock tests.

use wiremock::MockServer;

use pimsync_catalog::{CatalogClient, ClientOptions};
use pimsync_core::{SiteCredentials, SiteEntry, SiteKey};

pub(crate) fn site_entry(key: &str, base_url: &str) -> SiteEntry {
    SiteEntry {
        key: SiteKey::from(key),
        base_url: base_url.to_owned(),
        currency: "EUR".to_owned(),
        reference: key == "com",
    }
}

pub(crate) fn credentials() -> Option<SiteCredentials> {
    Some(SiteCredentials {
        api_key: "ck_test".to_owned(),
        api_secret: "cs_test".to_owned(),
    })
}

/// Zero back-off and no throttle pause so retry paths settle instantly.
pub(crate) fn fast_options() -> ClientOptions {
    ClientOptions {
        retry_backoff_base_secs: 0,
        throttle_pause_ms: 0,
        ..ClientOptions::default()
    }
}

pub(crate) fn mock_client(key: &str, server: &MockServer) -> CatalogClient {
    CatalogClient::new(&site_entry(key, &server.uri()), credentials(), fast_options())
        .expect("client construction should not fail")
}
