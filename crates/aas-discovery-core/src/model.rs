//! Asset-link data model.
//!
//! An AAS identifier owns a set of name/value asset links. Records are
//! validated on construction, so a store never sees an empty identifier,
//! an empty name or value, or a duplicated pair.

use crate::error::{DiscoveryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single name/value descriptor attached to an AAS identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetLink {
    /// Descriptor name (e.g., "serialNumber")
    pub name: String,
    /// Descriptor value (e.g., "SN-1234")
    pub value: String,
}

impl AssetLink {
    /// Create a new asset link.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Check that both name and value are non-empty.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` naming the empty field.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(DiscoveryError::InvalidInput(format!(
                "asset link name must not be empty (value '{}')",
                self.value
            )));
        }
        if self.value.is_empty() {
            return Err(DiscoveryError::InvalidInput(format!(
                "asset link '{}' has an empty value",
                self.name
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for AssetLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Reject an empty AAS identifier.
///
/// # Errors
///
/// Returns `InvalidInput` if `aas_id` is empty.
pub fn validate_aas_id(aas_id: &str) -> Result<()> {
    if aas_id.is_empty() {
        return Err(DiscoveryError::InvalidInput(
            "AAS identifier must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validate every link and collapse duplicates, keeping first occurrences.
///
/// # Errors
///
/// Returns `InvalidInput` on the first link with an empty name or value.
pub fn normalize_links(links: impl IntoIterator<Item = AssetLink>) -> Result<Vec<AssetLink>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for link in links {
        link.validate()?;
        if seen.insert(link.clone()) {
            out.push(link);
        }
    }
    Ok(out)
}

/// The validated descriptor set owned by one AAS identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLinkRecord {
    aas_id: String,
    links: Vec<AssetLink>,
}

impl AssetLinkRecord {
    /// Build a record, validating the identifier and every link.
    ///
    /// Duplicate pairs are collapsed; submission order is otherwise kept.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty identifier or an empty name/value.
    pub fn new(
        aas_id: impl Into<String>,
        links: impl IntoIterator<Item = AssetLink>,
    ) -> Result<Self> {
        let aas_id = aas_id.into();
        validate_aas_id(&aas_id)?;
        let links = normalize_links(links)?;
        Ok(Self { aas_id, links })
    }

    /// The owning AAS identifier.
    #[must_use]
    pub fn aas_id(&self) -> &str {
        &self.aas_id
    }

    /// The deduplicated links in submission order.
    #[must_use]
    pub fn links(&self) -> &[AssetLink] {
        &self.links
    }

    /// Split into identifier and links.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<AssetLink>) {
        (self.aas_id, self.links)
    }
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// No record existed for the identifier
    Created,
    /// An existing record was fully overwritten
    Replaced,
}

impl std::fmt::Display for RegisterOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegisterOutcome::Created => write!(f, "created"),
            RegisterOutcome::Replaced => write!(f, "replaced"),
        }
    }
}

/// Outcome of a delete; an absent record is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The record and its index entries were removed
    Deleted,
    /// No record was registered for the identifier
    NotFound,
}

impl std::fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeleteOutcome::Deleted => write!(f, "deleted"),
            DeleteOutcome::NotFound => write!(f, "not found"),
        }
    }
}

/// Search body as accepted by the lookup endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Pairs that every matching identifier must hold
    pub asset_links: Vec<AssetLink>,
    /// Page size; the service default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// Resume point returned by a previous page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Paging block of a search response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingMetadata {
    /// Encoded first identifier of the next page, absent at the end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// One page of matching AAS identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Matching identifiers in ascending order
    pub result: Vec<String>,
    /// Cursor for the next page
    pub paging_metadata: PagingMetadata,
}

impl SearchPage {
    /// A page with no results and no cursor.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The cursor for the next page, if more results remain.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        self.paging_metadata.cursor.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_collapses_duplicates_in_order() {
        let record = AssetLinkRecord::new(
            "urn:aas:test:1",
            [
                AssetLink::new("serialNumber", "SN-1"),
                AssetLink::new("plant", "P1"),
                AssetLink::new("serialNumber", "SN-1"),
                AssetLink::new("serialNumber", "SN-2"),
            ],
        )
        .unwrap();

        assert_eq!(
            record.links(),
            &[
                AssetLink::new("serialNumber", "SN-1"),
                AssetLink::new("plant", "P1"),
                AssetLink::new("serialNumber", "SN-2"),
            ]
        );
    }

    #[test]
    fn record_rejects_empty_fields() {
        assert!(AssetLinkRecord::new("", [AssetLink::new("a", "b")])
            .unwrap_err()
            .is_invalid_input());
        assert!(AssetLinkRecord::new("urn:x", [AssetLink::new("", "b")])
            .unwrap_err()
            .is_invalid_input());
        assert!(AssetLinkRecord::new("urn:x", [AssetLink::new("a", "")])
            .unwrap_err()
            .is_invalid_input());
    }

    #[test]
    fn record_allows_empty_link_set() {
        let record = AssetLinkRecord::new("urn:x", Vec::new()).unwrap();
        assert!(record.links().is_empty());
    }

    #[test]
    fn search_request_wire_names() {
        let req: SearchRequest = serde_json::from_value(serde_json::json!({
            "assetLinks": [{"name": "serialNumber", "value": "SN-1"}],
            "limit": 5
        }))
        .unwrap();

        assert_eq!(req.asset_links, vec![AssetLink::new("serialNumber", "SN-1")]);
        assert_eq!(req.limit, Some(5));
        assert_eq!(req.cursor, None);
    }

    #[test]
    fn search_page_omits_cursor_at_end() {
        let page = SearchPage {
            result: vec!["urn:a".to_string()],
            paging_metadata: PagingMetadata::default(),
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"result": ["urn:a"], "paging_metadata": {}})
        );
    }
}
