//! Descriptor store contract and the in-memory implementation.

use crate::error::{DiscoveryError, Result};
use crate::index::LinkIndex;
use crate::model::{AssetLink, AssetLinkRecord, DeleteOutcome, RegisterOutcome};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Durable mapping from AAS identifier to its asset links, plus the derived
/// link index.
///
/// Implementations must update the index in the same atomic unit as the
/// record, so that no reader observes one without the other. Operations on
/// the same identifier are linearizable.
pub trait DescriptorStore: Send + Sync {
    /// Store `record`, fully overwriting any previous links for its identifier.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backend fails; nothing is written in that case.
    fn register(&self, record: AssetLinkRecord) -> Result<RegisterOutcome>;

    /// Current links of `aas_id`, or `None` if no record exists.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backend fails.
    fn get(&self, aas_id: &str) -> Result<Option<Vec<AssetLink>>>;

    /// Remove the record and all of its index entries.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backend fails.
    fn delete(&self, aas_id: &str) -> Result<DeleteOutcome>;

    /// The first `take` identifiers, in ascending order, that hold every
    /// link in `query` and are `>= from` when given.
    ///
    /// The work done is bounded by `take`, not by the number of matches. The
    /// result comes from one consistent snapshot. An empty query matches
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backend fails.
    fn matches(&self, query: &[AssetLink], from: Option<&str>, take: usize) -> Result<Vec<String>>;
}

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<String, Vec<AssetLink>>,
    index: LinkIndex,
}

/// In-memory descriptor store.
///
/// Records and index share one lock. Critical sections perform no I/O, so
/// writers hold the lock only for the map updates themselves and readers
/// never wait on storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered records.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.records.len())
    }

    /// Check if no record is registered.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.records.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| DiscoveryError::storage("memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| DiscoveryError::storage("memory store lock poisoned"))
    }
}

impl DescriptorStore for MemoryStore {
    fn register(&self, record: AssetLinkRecord) -> Result<RegisterOutcome> {
        let (aas_id, links) = record.into_parts();
        let mut state = self.write()?;
        let MemoryState { records, index } = &mut *state;

        let outcome = match records.get_mut(&aas_id) {
            Some(current) => {
                index.replace(&aas_id, current, &links);
                *current = links;
                RegisterOutcome::Replaced
            }
            None => {
                index.insert(&aas_id, &links);
                records.insert(aas_id, links);
                RegisterOutcome::Created
            }
        };

        Ok(outcome)
    }

    fn get(&self, aas_id: &str) -> Result<Option<Vec<AssetLink>>> {
        Ok(self.read()?.records.get(aas_id).cloned())
    }

    fn delete(&self, aas_id: &str) -> Result<DeleteOutcome> {
        let mut state = self.write()?;
        let MemoryState { records, index } = &mut *state;

        match records.remove(aas_id) {
            Some(links) => {
                index.remove(aas_id, &links);
                Ok(DeleteOutcome::Deleted)
            }
            None => Ok(DeleteOutcome::NotFound),
        }
    }

    fn matches(
        &self,
        query: &[AssetLink],
        from: Option<&str>,
        take: usize,
    ) -> Result<Vec<String>> {
        Ok(self.read()?.index.matches(query, from, take))
    }
}
