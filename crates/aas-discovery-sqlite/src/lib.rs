//! # AAS Discovery `SQLite` Store
//!
//! Durable [`DescriptorStore`](aas_discovery_core::DescriptorStore) on `SQLite`.
//!
//! ## Layout
//!
//! - `aas_records`: one row per registered AAS identifier
//! - `asset_links`: the identifier's current name/value pairs
//! - `idx_asset_links_pair`: the link index, `(name, value, aas_id)`
//!
//! Register and delete run as `IMMEDIATE` transactions; reads take one
//! transaction so a search sees a single snapshot across all query pairs.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod persistence;

pub use persistence::SqliteStore;
