//! Per-site REST client for the storefront catalog API.
//!
//! One instance per storefront, authenticated with that site's key/secret
//! pair. Every call goes through the same bounded-timeout, retry-on-transient
//! request path; pagination is capped and self-throttled so a full catalog
//! walk cannot hammer a rate-limited remote.

use std::time::Duration;

use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use pimsync_core::{AppConfig, SiteCredentials, SiteEntry, SiteKey};

use crate::error::CatalogError;
use crate::retry::retry_with_backoff;
use crate::types::{
    AttributePayload, ProductPayload, ProductSummary, RemoteCategory, RemoteProduct,
    RemoteVariation, VariationBatch, VariationBatchResponse,
};

/// Attribute name under which size variations are attached.
pub const SIZE_ATTRIBUTE: &str = "Size";

const API_PATH: &str = "wp-json/wc/v3/";
const MAINTENANCE_PATH: &str = "wp-json/pimsync/v1/";

/// Tunables for one client instance, normally derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub request_timeout_secs: u64,
    /// Total attempts per request, including the first.
    pub max_attempts: u32,
    pub retry_backoff_base_secs: u64,
    pub page_size: u32,
    pub max_pages: usize,
    pub throttle_every_pages: usize,
    pub throttle_pause_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            max_attempts: 3,
            retry_backoff_base_secs: 2,
            page_size: 100,
            max_pages: 200,
            throttle_every_pages: 10,
            throttle_pause_ms: 500,
        }
    }
}

impl ClientOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout_secs: config.catalog_request_timeout_secs,
            max_attempts: config.catalog_max_attempts,
            retry_backoff_base_secs: config.catalog_retry_backoff_base_secs,
            page_size: config.catalog_page_size,
            max_pages: config.catalog_max_pages,
            throttle_every_pages: config.catalog_throttle_every_pages,
            throttle_pause_ms: config.catalog_throttle_pause_ms,
        }
    }
}

/// REST client for one storefront's catalog API.
pub struct CatalogClient {
    client: Client,
    site: SiteKey,
    api_base: Url,
    maintenance_base: Url,
    api_key: String,
    api_secret: String,
    options: ClientOptions,
}

impl CatalogClient {
    /// Creates a client for `entry`, failing fast when credentials are absent.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::MissingCredentials`] when `credentials` is `None`.
    /// - [`CatalogError::InvalidBaseUrl`] when the site's base URL does not parse.
    /// - [`CatalogError::Transport`] if the underlying `reqwest::Client`
    ///   cannot be constructed.
    pub fn new(
        entry: &SiteEntry,
        credentials: Option<SiteCredentials>,
        options: ClientOptions,
    ) -> Result<Self, CatalogError> {
        let Some(credentials) = credentials else {
            return Err(CatalogError::MissingCredentials {
                site: entry.key.clone(),
            });
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(options.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("pimsync/0.1 (catalog-sync)")
            .build()
            .map_err(|e| CatalogError::from_reqwest(&entry.base_url, e))?;

        // Ensure exactly one trailing slash so Url::join appends rather than
        // replaces the last path segment.
        let root = format!("{}/", entry.base_url.trim_end_matches('/'));
        let parse = |suffix: &str| -> Result<Url, CatalogError> {
            Url::parse(&root)
                .and_then(|u| u.join(suffix))
                .map_err(|e| CatalogError::InvalidBaseUrl {
                    url: entry.base_url.clone(),
                    reason: e.to_string(),
                })
        };

        Ok(Self {
            client,
            site: entry.key.clone(),
            api_base: parse(API_PATH)?,
            maintenance_base: parse(MAINTENANCE_PATH)?,
            api_key: credentials.api_key,
            api_secret: credentials.api_secret,
            options,
        })
    }

    #[must_use]
    pub fn site(&self) -> &SiteKey {
        &self.site
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.options.page_size
    }

    #[must_use]
    pub fn max_pages(&self) -> usize {
        self.options.max_pages
    }

    // -----------------------------------------------------------------------
    // Products
    // -----------------------------------------------------------------------

    /// Fetches one product by its remote id.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] when the id does not exist; transient
    /// errors after retries exhaust; [`CatalogError::Deserialize`] on an
    /// unexpected body.
    pub async fn get_product(&self, id: i64) -> Result<RemoteProduct, CatalogError> {
        self.request(Method::GET, &format!("products/{id}"), &[], None::<&()>)
            .await
    }

    /// Looks a product up by SKU. Returns `None` when no remote product
    /// carries that SKU — used to detect "exists remotely but not linked".
    ///
    /// # Errors
    ///
    /// Propagates request errors; an empty result set is not an error.
    pub async fn find_by_sku(&self, sku: &str) -> Result<Option<ProductSummary>, CatalogError> {
        let found: Vec<ProductSummary> = self
            .request(
                Method::GET,
                "products",
                &[("sku", sku.to_owned())],
                None::<&()>,
            )
            .await?;
        Ok(found.into_iter().next())
    }

    /// Creates a remote product.
    ///
    /// # Errors
    ///
    /// Propagates request errors; validation failures surface as
    /// [`CatalogError::Status`] with the remote's message.
    pub async fn create_product(
        &self,
        payload: &ProductPayload,
    ) -> Result<RemoteProduct, CatalogError> {
        self.request(Method::POST, "products", &[], Some(payload))
            .await
    }

    /// Applies a partial update. Callers should skip the call entirely when
    /// [`ProductPayload::is_empty`] — this method does not second-guess them.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn update_product(
        &self,
        id: i64,
        payload: &ProductPayload,
    ) -> Result<RemoteProduct, CatalogError> {
        self.request(Method::PUT, &format!("products/{id}"), &[], Some(payload))
            .await
    }

    /// Deletes a product, optionally bypassing the remote trash.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn delete_product(
        &self,
        id: i64,
        force: bool,
    ) -> Result<RemoteProduct, CatalogError> {
        self.request(
            Method::DELETE,
            &format!("products/{id}"),
            &[("force", force.to_string())],
            None::<&()>,
        )
        .await
    }

    /// Fetches one page of the product list.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn list_products_page(&self, page: usize) -> Result<Vec<RemoteProduct>, CatalogError> {
        self.request(
            Method::GET,
            "products",
            &[
                ("page", page.to_string()),
                ("per_page", self.options.page_size.to_string()),
            ],
            None::<&()>,
        )
        .await
    }

    /// Walks the whole product list: fixed-size pages until a short page,
    /// capped at `max_pages`, pausing briefly every `throttle_every_pages`
    /// pages.
    ///
    /// # Errors
    ///
    /// [`CatalogError::PaginationLimit`] if the cap is exceeded; otherwise
    /// propagates page-level errors.
    pub async fn list_all_products(&self) -> Result<Vec<RemoteProduct>, CatalogError> {
        let mut all = Vec::new();
        let mut page = 1usize;
        loop {
            if page > self.options.max_pages {
                return Err(CatalogError::PaginationLimit {
                    url: self.api_base.to_string(),
                    max_pages: self.options.max_pages,
                });
            }
            self.throttle(page).await;

            let batch = self.list_products_page(page).await?;
            let short = batch.len() < self.options.page_size as usize;
            all.extend(batch);
            tracing::debug!(site = %self.site, page, total = all.len(), "fetched product page");
            if short {
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    // -----------------------------------------------------------------------
    // Variations
    // -----------------------------------------------------------------------

    /// Lists all variations of a product (single page; size runs never exceed
    /// one page).
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn list_variations(
        &self,
        product_id: i64,
    ) -> Result<Vec<RemoteVariation>, CatalogError> {
        self.request(
            Method::GET,
            &format!("products/{product_id}/variations"),
            &[("per_page", self.options.page_size.to_string())],
            None::<&()>,
        )
        .await
    }

    /// Creates, updates, and deletes variations in a single remote call.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn batch_variations(
        &self,
        product_id: i64,
        batch: &VariationBatch,
    ) -> Result<VariationBatchResponse, CatalogError> {
        self.request(
            Method::POST,
            &format!("products/{product_id}/variations/batch"),
            &[],
            Some(batch),
        )
        .await
    }

    /// Converts a simple product to a variable one: attaches the size
    /// attribute and moves stock management to the parent.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn convert_to_variable(
        &self,
        product_id: i64,
        size_options: &[&str],
    ) -> Result<RemoteProduct, CatalogError> {
        let payload = ProductPayload {
            product_type: Some("variable".to_owned()),
            manage_stock: Some(true),
            attributes: Some(vec![AttributePayload {
                name: SIZE_ATTRIBUTE.to_owned(),
                options: size_options.iter().map(|s| (*s).to_owned()).collect(),
                variation: true,
                visible: true,
            }]),
            ..ProductPayload::default()
        };
        self.update_product(product_id, &payload).await
    }

    // -----------------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------------

    /// Lists every category, paginated like [`Self::list_all_products`].
    ///
    /// # Errors
    ///
    /// [`CatalogError::PaginationLimit`] if the cap is exceeded; otherwise
    /// propagates page-level errors.
    pub async fn list_categories(&self) -> Result<Vec<RemoteCategory>, CatalogError> {
        let mut all = Vec::new();
        let mut page = 1usize;
        loop {
            if page > self.options.max_pages {
                return Err(CatalogError::PaginationLimit {
                    url: self.api_base.to_string(),
                    max_pages: self.options.max_pages,
                });
            }
            self.throttle(page).await;

            let batch: Vec<RemoteCategory> = self
                .request(
                    Method::GET,
                    "products/categories",
                    &[
                        ("page", page.to_string()),
                        ("per_page", self.options.page_size.to_string()),
                    ],
                    None::<&()>,
                )
                .await?;
            let short = batch.len() < self.options.page_size as usize;
            all.extend(batch);
            if short {
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    /// Finds a category by exact (case-insensitive) name.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn find_category(&self, name: &str) -> Result<Option<RemoteCategory>, CatalogError> {
        let found: Vec<RemoteCategory> = self
            .request(
                Method::GET,
                "products/categories",
                &[("search", name.to_owned()), ("per_page", "100".to_owned())],
                None::<&()>,
            )
            .await?;
        Ok(found
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn create_category(&self, name: &str) -> Result<RemoteCategory, CatalogError> {
        self.request(
            Method::POST,
            "products/categories",
            &[],
            Some(&serde_json::json!({ "name": name })),
        )
        .await
    }

    /// Find-or-create by name; the create path runs only on a confirmed miss.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn find_or_create_category(
        &self,
        name: &str,
    ) -> Result<RemoteCategory, CatalogError> {
        if let Some(existing) = self.find_category(name).await? {
            return Ok(existing);
        }
        self.create_category(name).await
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    /// Asks the site-side maintenance plugin to purge a product's orphaned
    /// media before new images are applied. Best-effort at the call site:
    /// reconciliation must not abort when this fails.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn cleanup_product_media(&self, product_id: i64) -> Result<(), CatalogError> {
        let url = self
            .maintenance_base
            .join(&format!("products/{product_id}/media-cleanup"))
            .map_err(|e| CatalogError::InvalidBaseUrl {
                url: self.maintenance_base.to_string(),
                reason: e.to_string(),
            })?;
        let _: serde_json::Value = self.dispatch(Method::POST, url, None::<&()>).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Request plumbing
    // -----------------------------------------------------------------------

    /// Pause between pages so long catalog walks stay under the remote's
    /// rate limits.
    async fn throttle(&self, page: usize) {
        if self.options.throttle_every_pages > 0
            && page > 1
            && (page - 1) % self.options.throttle_every_pages == 0
        {
            tokio::time::sleep(Duration::from_millis(self.options.throttle_pause_ms)).await;
        }
    }

    fn api_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, CatalogError> {
        let mut url =
            self.api_base
                .join(path.trim_start_matches('/'))
                .map_err(|e| CatalogError::InvalidBaseUrl {
                    url: self.api_base.to_string(),
                    reason: e.to_string(),
                })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    pub(crate) async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, CatalogError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.api_url(path, query)?;
        self.dispatch(method, url, body).await
    }

    async fn dispatch<T, B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T, CatalogError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        retry_with_backoff(
            self.options.max_attempts,
            self.options.retry_backoff_base_secs,
            || {
                let method = method.clone();
                let url = url.clone();
                async move { self.execute(method, url, body).await }
            },
        )
        .await
    }

    async fn execute<T, B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T, CatalogError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self
            .client
            .request(method, url.clone())
            .basic_auth(&self.api_key, Some(&self.api_secret));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CatalogError::from_reqwest(url.as_str(), e))?;
        let status = response.status();

        match status.as_u16() {
            401 => {
                return Err(CatalogError::Unauthorized {
                    url: url.to_string(),
                })
            }
            404 => {
                return Err(CatalogError::NotFound {
                    url: url.to_string(),
                })
            }
            502 | 503 | 504 => {
                return Err(CatalogError::Unavailable {
                    status: status.as_u16(),
                    url: url.to_string(),
                })
            }
            _ if !status.is_success() => {
                let text = response.text().await.unwrap_or_default();
                let snippet: String = text.chars().take(200).collect();
                return Err(CatalogError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                    body: snippet,
                });
            }
            _ => {}
        }

        let text = response
            .text()
            .await
            .map_err(|e| CatalogError::from_reqwest(url.as_str(), e))?;
        serde_json::from_str(&text).map_err(|e| CatalogError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
