use thiserror::Error;

/// Errors from the object-store client.
///
/// Callers of [`crate::AssetStore::relocate_images`] never see these per
/// image: relocation degrades to keeping the original source URL. They
/// surface only from direct store operations (upload, delete, existence).
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset store misconfigured: {0}")]
    Config(String),

    #[error("invalid storage URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected storage status {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("download of {url} failed with status {status}")]
    Download { status: u16, url: String },
}
