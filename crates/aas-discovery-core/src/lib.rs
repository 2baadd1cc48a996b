//! # AAS Discovery Core
//!
//! Asset-link index for discovering Asset Administration Shells by their
//! name/value descriptors (e.g. `serialNumber=SN-1234`).
//!
//! This crate provides:
//! - The asset-link data model with validation and duplicate collapsing
//! - A link index mapping each pair to the identifiers holding it
//! - The [`DescriptorStore`] contract and an in-memory implementation
//! - Intersection search with stateless, base64url cursor paging
//! - The [`DiscoveryService`] entry point and an async [`DiscoveryHandle`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod error;
pub mod handle;
pub mod index;
pub mod model;
pub mod search;
pub mod service;
pub mod store;

pub use cursor::{decode_id_base64url, encode_id_base64url, Cursor, EncodingError};
pub use error::{DiscoveryError, Result};
pub use handle::DiscoveryHandle;
pub use index::LinkIndex;
pub use model::{
    AssetLink, AssetLinkRecord, DeleteOutcome, PagingMetadata, RegisterOutcome, SearchPage,
    SearchRequest,
};
pub use search::SearchEngine;
pub use service::{DiscoveryService, DEFAULT_SEARCH_LIMIT};
pub use store::{DescriptorStore, MemoryStore};
