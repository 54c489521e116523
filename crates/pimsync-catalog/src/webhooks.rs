//! Webhook sub-operations of the catalog client.

use reqwest::Method;

use crate::error::CatalogError;
use crate::types::Webhook;
use crate::CatalogClient;

impl CatalogClient {
    /// Lists registered webhooks (single page; sites carry a handful at most).
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn list_webhooks(&self) -> Result<Vec<Webhook>, CatalogError> {
        self.request(
            Method::GET,
            "webhooks",
            &[("per_page", "100".to_owned())],
            None::<&()>,
        )
        .await
    }

    /// Registers a webhook for `topic` (e.g. `"order.created"`) delivering to
    /// `delivery_url`. Idempotence is the caller's concern: check
    /// [`Self::list_webhooks`] first to avoid duplicates.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn create_webhook(
        &self,
        topic: &str,
        delivery_url: &str,
    ) -> Result<Webhook, CatalogError> {
        self.request(
            Method::POST,
            "webhooks",
            &[],
            Some(&serde_json::json!({
                "name": format!("pimsync {topic}"),
                "topic": topic,
                "delivery_url": delivery_url,
            })),
        )
        .await
    }
}
