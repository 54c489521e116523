use std::path::PathBuf;

/// Process-level configuration, sourced from environment variables.
///
/// Site roster and per-site credentials live in `config/sites.yaml` plus
/// `PIMSYNC_SITE_<KEY>_API_KEY` / `_API_SECRET`; see [`crate::sites`].
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub sites_path: PathBuf,

    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,

    pub catalog_request_timeout_secs: u64,
    pub catalog_max_attempts: u32,
    pub catalog_retry_backoff_base_secs: u64,
    pub catalog_page_size: u32,
    pub catalog_max_pages: usize,
    pub catalog_throttle_every_pages: usize,
    pub catalog_throttle_pause_ms: u64,

    pub storage_url: String,
    pub storage_bucket: String,
    pub storage_service_key: String,

    pub sync_max_workers: usize,
    pub sync_retry_attempts: u32,
    pub sync_cooldown_after_failure_ms: u64,
    pub pull_batch_write_size: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("sites_path", &self.sites_path)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "catalog_request_timeout_secs",
                &self.catalog_request_timeout_secs,
            )
            .field("catalog_max_attempts", &self.catalog_max_attempts)
            .field(
                "catalog_retry_backoff_base_secs",
                &self.catalog_retry_backoff_base_secs,
            )
            .field("catalog_page_size", &self.catalog_page_size)
            .field("catalog_max_pages", &self.catalog_max_pages)
            .field(
                "catalog_throttle_every_pages",
                &self.catalog_throttle_every_pages,
            )
            .field("catalog_throttle_pause_ms", &self.catalog_throttle_pause_ms)
            .field("storage_url", &self.storage_url)
            .field("storage_bucket", &self.storage_bucket)
            .field("storage_service_key", &"[redacted]")
            .field("sync_max_workers", &self.sync_max_workers)
            .field("sync_retry_attempts", &self.sync_retry_attempts)
            .field(
                "sync_cooldown_after_failure_ms",
                &self.sync_cooldown_after_failure_ms,
            )
            .field("pull_batch_write_size", &self.pull_batch_write_size)
            .finish()
    }
}
