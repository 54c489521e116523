//! Content-addressed image relocation into the system's own object store.
//!
//! Remote sites re-host whatever image URLs they are given; relocating every
//! source image into one deduplicated bucket first keeps four sites from
//! downloading four copies and keeps dead third-party URLs out of the
//! catalog. Addressing is by SHA-256 of the source URL, so presence can be
//! checked before any byte is downloaded.

mod error;
mod store;

pub use error::AssetError;
pub use store::{AssetStore, RelocationReport};
