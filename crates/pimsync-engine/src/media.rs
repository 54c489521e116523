//! Image staging for a product push.
//!
//! Source images are relocated into the shared asset store before any URL is
//! handed to a storefront, so that every site serves the same copy. URLs that
//! fail relocation or do not verify as images are dropped from the payload
//! rather than failing the push.

use pimsync_assets::AssetStore;
use pimsync_catalog::types::ImagePayload;
use pimsync_catalog::CatalogClient;

/// Outcome of staging one product's images.
#[derive(Debug, Default)]
pub struct StagedMedia {
    /// Payload entries for every image that survived staging, in order.
    pub images: Vec<ImagePayload>,
    /// Store paths uploaded during this staging; purged once the push that
    /// requested them succeeds and the site has ingested the images.
    pub migrated_paths: Vec<String>,
    pub dropped: usize,
}

impl StagedMedia {
    #[must_use]
    pub fn srcs(&self) -> Vec<&str> {
        self.images.iter().map(|i| i.src.as_str()).collect()
    }
}

/// Relocates `sources` into the asset store and verifies each resulting URL
/// actually serves an image. Never fails the push: a bad image is dropped
/// with a warning.
pub async fn stage_images(store: &AssetStore, sources: &[String]) -> StagedMedia {
    let report = store.relocate_images(sources).await;
    let mut staged = StagedMedia {
        migrated_paths: report.migrated_paths,
        ..StagedMedia::default()
    };

    for url in report.urls {
        if store.verify_image(&url).await {
            staged.images.push(ImagePayload { src: url });
        } else {
            tracing::warn!(url = %url, "dropping image that does not verify");
            staged.dropped += 1;
        }
    }
    staged
}

/// Best-effort removal of the staging copies uploaded for a push that
/// succeeded. The site has ingested the images into its own media library by
/// then, so the staging objects only accrue storage cost. A push that fails
/// leaves storage untouched.
pub async fn purge_staged(store: &AssetStore, staged: &StagedMedia) {
    if staged.migrated_paths.is_empty() {
        return;
    }
    if let Err(error) = store.delete_objects(&staged.migrated_paths).await {
        tracing::warn!(%error, "failed to purge staged images");
    }
}

/// Asks the site's maintenance endpoint to purge media orphaned by a previous
/// image replacement. Best-effort: sites without the maintenance plugin
/// respond 404 and the push continues.
pub async fn request_media_cleanup(client: &CatalogClient, product_id: i64) {
    if let Err(error) = client.cleanup_product_media(product_id).await {
        tracing::debug!(
            site = %client.site(),
            product_id,
            %error,
            "media cleanup hook unavailable"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> AssetStore {
        AssetStore::new(&format!("{}/storage/v1", server.uri()), "product-images", "svc_test")
            .unwrap()
    }

    #[tokio::test]
    async fn urls_that_fail_verification_are_dropped() {
        let server = MockServer::start().await;

        // Already-relocated URLs skip download; only the HEAD verify runs.
        let good = format!(
            "{}/storage/v1/object/public/product-images/products/aa.jpg",
            server.uri()
        );
        let bad = format!(
            "{}/storage/v1/object/public/product-images/products/bb.jpg",
            server.uri()
        );

        Mock::given(method("HEAD"))
            .and(path_regex(r"/products/aa\.jpg$"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/jpeg"))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path_regex(r"/products/bb\.jpg$"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
            .mount(&server)
            .await;

        let staged = stage_images(&store(&server), &[good.clone(), bad]).await;

        assert_eq!(staged.srcs(), vec![good.as_str()]);
        assert_eq!(staged.dropped, 1);
        assert!(staged.migrated_paths.is_empty());
    }

    #[tokio::test]
    async fn cleanup_hook_failure_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "no route"})))
            .mount(&server)
            .await;

        let client = crate::test_support::mock_client("uk", &server);
        // Must not panic or error out.
        request_media_cleanup(&client, 12).await;
    }
}
