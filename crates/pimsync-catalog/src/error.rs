use pimsync_core::SiteKey;
use thiserror::Error;

/// Errors returned by the per-site catalog API client.
///
/// Retryability is a property of the error, not of its message: callers must
/// use [`CatalogError::is_transient`] instead of inspecting strings.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("site '{site}' is missing API credentials")]
    MissingCredentials { site: SiteKey },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The request hit the client-side deadline. Kept distinct from
    /// [`CatalogError::Unavailable`]: a timeout says nothing about the
    /// remote's health.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Connection-level failure (reset, DNS, TLS).
    #[error("HTTP transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unauthorized (401) from {url}")]
    Unauthorized { url: String },

    #[error("not found (404): {url}")]
    NotFound { url: String },

    /// 502/503/504 — the remote is temporarily unable to serve.
    #[error("remote unavailable ({status}) at {url}")]
    Unavailable { status: u16, url: String },

    /// Any other non-2xx status. Never retried.
    #[error("unexpected HTTP status {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("pagination limit reached for {url}: exceeded {max_pages} pages")]
    PaginationLimit { url: String, max_pages: usize },
}

impl CatalogError {
    /// `true` for errors worth retrying after a back-off delay: timeouts,
    /// transport failures, and 502/503/504. Everything else (401, 404,
    /// validation 4xx, parse failures) is permanent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CatalogError::Timeout { .. }
                | CatalogError::Transport { .. }
                | CatalogError::Unavailable { .. }
        )
    }

    /// Maps a `reqwest` send-level error, splitting timeouts out into their
    /// own variant.
    pub(crate) fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            CatalogError::Timeout {
                url: url.to_owned(),
            }
        } else {
            CatalogError::Transport {
                url: url.to_owned(),
                source,
            }
        }
    }
}
