//! Data-driven content definitions and loaders.
//!
//! This crate reads the data files an activation session is configured with:
//! - Item catalogs (RON), validated against the trigger matrix on load
//! - Rules configuration (TOML)
//!
//! All loaders deserialize skirmish-core types directly.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentFactory, ItemCatalog, ItemLoader, LoadResult};
