//! Registration service: the validated entry point for every operation.

use crate::error::{DiscoveryError, Result};
use crate::model::{
    validate_aas_id, AssetLink, AssetLinkRecord, DeleteOutcome, RegisterOutcome, SearchPage,
    SearchRequest,
};
use crate::search::SearchEngine;
use crate::store::DescriptorStore;

/// Page size used when a search request does not name one.
pub const DEFAULT_SEARCH_LIMIT: i64 = 100;

/// Discovery operations over a descriptor store.
#[derive(Debug)]
pub struct DiscoveryService<S> {
    store: S,
    default_limit: i64,
}

impl<S: DescriptorStore> DiscoveryService<S> {
    /// Create a service over `store`.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            default_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Override the page size applied to requests without a limit.
    #[must_use]
    pub fn with_default_limit(mut self, limit: i64) -> Self {
        self.default_limit = limit;
        self
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register `links` for `aas_id`, replacing any previous set.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty identifier or an empty name/value,
    /// before anything is written; `Storage` if the store fails.
    pub fn register(&self, aas_id: &str, links: Vec<AssetLink>) -> Result<RegisterOutcome> {
        let record = AssetLinkRecord::new(aas_id, links)?;
        let link_count = record.links().len();
        let outcome = self.store.register(record)?;

        tracing::info!(aas_id, links = link_count, %outcome, "Registered asset links");
        Ok(outcome)
    }

    /// Current links of `aas_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record exists, `InvalidInput` for an empty
    /// identifier, `Storage` if the store fails.
    pub fn fetch(&self, aas_id: &str) -> Result<Vec<AssetLink>> {
        validate_aas_id(aas_id)?;
        self.store
            .get(aas_id)?
            .ok_or_else(|| DiscoveryError::NotFound(aas_id.to_string()))
    }

    /// Remove the record of `aas_id`.
    ///
    /// Deleting an absent record reports [`DeleteOutcome::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty identifier, `Storage` if the store
    /// fails.
    pub fn delete(&self, aas_id: &str) -> Result<DeleteOutcome> {
        validate_aas_id(aas_id)?;
        let outcome = self.store.delete(aas_id)?;

        match outcome {
            DeleteOutcome::Deleted => tracing::info!(aas_id, "Deleted asset links"),
            DeleteOutcome::NotFound => tracing::debug!(aas_id, "Delete of absent record"),
        }
        Ok(outcome)
    }

    /// Identifiers holding every link in `query`, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a negative limit, a malformed cursor, or an
    /// empty name/value; `Storage` if the store fails.
    pub fn search(
        &self,
        query: &[AssetLink],
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<SearchPage> {
        SearchEngine::new(&self.store).search(query, limit, cursor)
    }

    /// Run a search request, applying the default limit when none is given.
    ///
    /// # Errors
    ///
    /// See [`DiscoveryService::search`].
    pub fn search_request(&self, request: &SearchRequest) -> Result<SearchPage> {
        self.search(
            &request.asset_links,
            request.limit.unwrap_or(self.default_limit),
            request.cursor.as_deref(),
        )
    }
}
