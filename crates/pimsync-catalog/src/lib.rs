//! Typed REST client for the per-site storefront catalog APIs.
//!
//! One [`CatalogClient`] per storefront. Transient failures (timeouts,
//! transport errors, 502/503/504) are retried with linear back-off inside the
//! client; callers above it never re-retry the same HTTP call and never
//! inspect error strings — see [`CatalogError::is_transient`].

mod client;
mod error;
mod orders;
mod retry;
pub mod types;
mod webhooks;

pub use client::{CatalogClient, ClientOptions, SIZE_ATTRIBUTE};
pub use error::CatalogError;
