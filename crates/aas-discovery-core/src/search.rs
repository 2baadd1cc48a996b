//! Intersection search with stateless cursor paging.
//!
//! A query matches an identifier when every query link is among the
//! identifier's links. Matches are ordered lexicographically; a page holds
//! up to `limit` identifiers and, when more remain, a cursor naming the first
//! identifier of the next page.

use crate::cursor::Cursor;
use crate::error::{DiscoveryError, Result};
use crate::model::{normalize_links, AssetLink, PagingMetadata, SearchPage};
use crate::store::DescriptorStore;

/// Read-only search over a descriptor store's link index.
#[derive(Debug)]
pub struct SearchEngine<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: DescriptorStore + ?Sized> SearchEngine<'a, S> {
    /// Create a search engine reading from `store`.
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Find identifiers holding every link in `query`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a negative `limit`, a malformed `cursor`, or
    /// a query link with an empty name or value; `Storage` if the store fails.
    pub fn search(
        &self,
        query: &[AssetLink],
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<SearchPage> {
        let limit = usize::try_from(limit).map_err(|_| {
            DiscoveryError::InvalidInput(format!("limit must not be negative, got {limit}"))
        })?;
        let cursor = Cursor::parse(cursor)?;
        let query = normalize_links(query.iter().cloned())?;

        if query.is_empty() {
            return Ok(SearchPage::empty());
        }

        let from = cursor.as_ref().map(Cursor::next_id);
        // One extra match tells whether another page exists.
        let mut matches = self.store.matches(&query, from, limit.saturating_add(1))?;
        let next = if matches.len() > limit {
            matches.pop().map(Cursor::at)
        } else {
            None
        };

        tracing::debug!(
            query_links = query.len(),
            limit,
            results = matches.len(),
            has_more = next.is_some(),
            "Search evaluated"
        );

        Ok(SearchPage {
            result: matches,
            paging_metadata: PagingMetadata {
                cursor: next.as_ref().map(Cursor::encode),
            },
        })
    }
}
