//! Scene search against a STAC catalog.
//!
//! [`SceneCatalog`] issues one search per call through a [`CatalogTransport`],
//! retries transient failures according to a [`RetryPolicy`], and returns
//! scenes ranked by ascending cloud cover.

pub mod client;
pub mod error;
pub mod retry;
pub mod stac;
pub mod transport;

pub use client::{rank_scenes, CatalogConfig, SceneCatalog};
pub use error::CatalogError;
pub use retry::RetryPolicy;
pub use stac::{SortBy, StacAsset, StacItem, StacItemCollection, StacSearchRequest};
pub use transport::{CatalogTransport, ReqwestTransport};
