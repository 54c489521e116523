use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use sha2::{Digest, Sha256};

use pimsync_core::AppConfig;

use crate::error::AssetError;

const DOWNLOAD_TIMEOUT_SECS: u64 = 60;

/// Outcome of relocating one product's image set.
///
/// `urls` is the full ordered image list to publish: relocated URLs where
/// relocation worked, original source URLs where it did not. `migrated_paths`
/// names only the objects this run created, the set eligible for post-publish
/// cleanup.
#[derive(Debug, Default)]
pub struct RelocationReport {
    pub urls: Vec<String>,
    pub migrated_paths: Vec<String>,
    pub skipped: usize,
    pub failed: usize,
}

/// Client for the object-storage API (upload, existence, public URL, batch
/// delete), plus the URL-addressed relocation logic built on top of it.
pub struct AssetStore {
    client: Client,
    base_url: Url,
    bucket: String,
    service_key: String,
}

impl AssetStore {
    /// # Errors
    ///
    /// Returns [`AssetError::Config`] when bucket or key are empty,
    /// [`AssetError::InvalidUrl`] when the base URL does not parse, or
    /// [`AssetError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, bucket: &str, service_key: &str) -> Result<Self, AssetError> {
        if bucket.is_empty() {
            return Err(AssetError::Config("storage bucket is empty".to_owned()));
        }
        if service_key.is_empty() {
            return Err(AssetError::Config(
                "storage service key is empty".to_owned(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("pimsync/0.1 (asset-relocation)")
            .build()
            .map_err(|e| AssetError::Transport {
                url: base_url.to_owned(),
                source: e,
            })?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| AssetError::InvalidUrl {
            url: normalised.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            bucket: bucket.to_owned(),
            service_key: service_key.to_owned(),
        })
    }

    /// # Errors
    ///
    /// See [`AssetStore::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, AssetError> {
        Self::new(
            &config.storage_url,
            &config.storage_bucket,
            &config.storage_service_key,
        )
    }

    /// Deterministic object path for a source URL:
    /// `products/{sha256(source)}.{ext}`. The extension is carried over from
    /// the source so remote sites serve the right content type.
    #[must_use]
    pub fn object_path(source_url: &str) -> String {
        let hash = format!("{:x}", Sha256::digest(source_url.as_bytes()));
        let ext = extension_of(source_url);
        format!("products/{hash}.{ext}")
    }

    /// Public (unauthenticated) URL of an object.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!("{}object/public/{}/{path}", self.base_url, self.bucket)
    }

    /// Whether an object is already present, via a `HEAD` on its public URL.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::Transport`] on network failure. Any non-2xx
    /// status reads as "absent".
    pub async fn exists(&self, path: &str) -> Result<bool, AssetError> {
        let url = self.public_url(path);
        let response = self
            .client
            .head(&url)
            .send()
            .await
            .map_err(|e| AssetError::Transport {
                url: url.clone(),
                source: e,
            })?;
        Ok(response.status().is_success())
    }

    /// Uploads object bytes. A `409 Conflict` means another worker got there
    /// first with the same path; since paths are content-addressed that is a
    /// success, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::Transport`] or [`AssetError::Status`].
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AssetError> {
        let url = format!("{}object/{}/{path}", self.base_url, self.bucket);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AssetError::Transport {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        if status.is_success() || status == StatusCode::CONFLICT {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(AssetError::Status {
            status: status.as_u16(),
            url,
            body: body.chars().take(200).collect(),
        })
    }

    /// Deletes a set of objects in one call. Used for post-publish staging
    /// cleanup; callers must pass only paths they created this run.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::Transport`] or [`AssetError::Status`].
    pub async fn delete_objects(&self, paths: &[String]) -> Result<(), AssetError> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = format!("{}object/{}", self.base_url, self.bucket);
        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(|e| AssetError::Transport {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(AssetError::Status {
            status: status.as_u16(),
            url,
            body: body.chars().take(200).collect(),
        })
    }

    /// `HEAD`s a URL and checks the `Content-Type` is a recognized image
    /// MIME type. Any failure reads as "not an image".
    pub async fn verify_image(&self, url: &str) -> bool {
        let Ok(response) = self.client.head(url).send().await else {
            return false;
        };
        if !response.status().is_success() {
            return false;
        }
        response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("image/"))
    }

    /// Relocates an ordered image list into the store, deduplicated by
    /// source URL.
    ///
    /// Per image: already in this store → kept as-is; object present →
    /// reused (skip, no download); otherwise download once and upload once.
    /// Any per-image failure keeps the original source URL and moves on —
    /// a broken image must not fail the whole sync.
    pub async fn relocate_images(&self, sources: &[String]) -> RelocationReport {
        let mut report = RelocationReport::default();
        let own_prefix = format!("{}object/public/{}/", self.base_url, self.bucket);

        for source in sources {
            if source.starts_with(&own_prefix) {
                report.urls.push(source.clone());
                report.skipped += 1;
                continue;
            }

            let path = Self::object_path(source);
            match self.relocate_one(source, &path).await {
                Ok(true) => {
                    report.urls.push(self.public_url(&path));
                    report.migrated_paths.push(path);
                }
                Ok(false) => {
                    report.urls.push(self.public_url(&path));
                    report.skipped += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        source,
                        error = %err,
                        "image relocation failed — keeping source URL"
                    );
                    report.urls.push(source.clone());
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Returns `Ok(true)` when the object was uploaded by this call,
    /// `Ok(false)` when it was already present.
    async fn relocate_one(&self, source: &str, path: &str) -> Result<bool, AssetError> {
        if self.exists(path).await? {
            return Ok(false);
        }

        let response = self
            .client
            .get(source)
            .send()
            .await
            .map_err(|e| AssetError::Transport {
                url: source.to_owned(),
                source: e,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Download {
                status: status.as_u16(),
                url: source.to_owned(),
            });
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_owned();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AssetError::Transport {
                url: source.to_owned(),
                source: e,
            })?
            .to_vec();

        self.upload(path, bytes, &content_type).await?;
        Ok(true)
    }
}

/// File extension of a URL path, lowercased; `jpg` when unrecognizable.
fn extension_of(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" | "png" | "webp" | "gif" | "svg" | "avif" => ext,
        _ => "jpg".to_owned(),
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
