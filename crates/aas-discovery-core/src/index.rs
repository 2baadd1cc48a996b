//! Link index: which AAS identifiers hold a given asset link.
//!
//! The index is derived state. It is only ever changed together with the
//! record it mirrors, so replaying the records alone rebuilds it exactly.

use crate::model::AssetLink;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::Bound;

/// Posting sets keyed by asset link.
///
/// Identifiers in a posting set are kept sorted so that searches can page
/// through them in lexicographic order. Empty posting sets are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkIndex {
    postings: HashMap<AssetLink, BTreeSet<String>>,
}

impl LinkIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `aas_id` to the posting set of every link.
    pub fn insert<'a>(&mut self, aas_id: &str, links: impl IntoIterator<Item = &'a AssetLink>) {
        for link in links {
            self.postings
                .entry(link.clone())
                .or_default()
                .insert(aas_id.to_string());
        }
    }

    /// Remove `aas_id` from the posting set of every link.
    pub fn remove<'a>(&mut self, aas_id: &str, links: impl IntoIterator<Item = &'a AssetLink>) {
        for link in links {
            if let Some(ids) = self.postings.get_mut(link) {
                ids.remove(aas_id);
                if ids.is_empty() {
                    self.postings.remove(link);
                }
            }
        }
    }

    /// Move `aas_id` from `old` to `new`, touching only the pairs that changed.
    pub fn replace(&mut self, aas_id: &str, old: &[AssetLink], new: &[AssetLink]) {
        let old_set: HashSet<&AssetLink> = old.iter().collect();
        let new_set: HashSet<&AssetLink> = new.iter().collect();

        self.remove(aas_id, old_set.difference(&new_set).copied());
        self.insert(aas_id, new_set.difference(&old_set).copied());
    }

    /// Identifiers holding `link` in ascending order, starting at `from`
    /// (inclusive) when given.
    pub fn ids<'a>(
        &'a self,
        link: &AssetLink,
        from: Option<&'a str>,
    ) -> impl Iterator<Item = &'a str> + 'a {
        let lower = from.map_or(Bound::Unbounded, Bound::Included);
        self.postings.get(link).into_iter().flat_map(move |ids| {
            ids.range::<str, _>((lower, Bound::Unbounded))
                .map(String::as_str)
        })
    }

    /// Number of identifiers holding `link`.
    #[must_use]
    pub fn holders(&self, link: &AssetLink) -> usize {
        self.postings.get(link).map_or(0, BTreeSet::len)
    }

    /// Check if `aas_id` holds `link`.
    #[must_use]
    pub fn contains(&self, link: &AssetLink, aas_id: &str) -> bool {
        self.postings
            .get(link)
            .is_some_and(|ids| ids.contains(aas_id))
    }

    /// First `take` identifiers `>= from` holding every link in `query`.
    ///
    /// Walks the rarest link's posting set in order and probes the others,
    /// stopping after `take` hits. Nothing past the last hit is visited.
    #[must_use]
    pub fn matches(&self, query: &[AssetLink], from: Option<&str>, take: usize) -> Vec<String> {
        let Some(rarest) = query.iter().min_by_key(|link| self.holders(link)) else {
            return Vec::new();
        };

        self.ids(rarest, from)
            .filter(|id| {
                query
                    .iter()
                    .filter(|link| *link != rarest)
                    .all(|link| self.contains(link, id))
            })
            .take(take)
            .map(str::to_string)
            .collect()
    }

    /// Number of distinct links with at least one holder.
    #[must_use]
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Check if the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}
