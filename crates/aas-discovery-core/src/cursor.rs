//! Search cursors.
//!
//! A cursor is the first identifier of the next page, written as unpadded
//! base64url (the identifier encoding of AAS Part 2). Paging keeps no state
//! between calls; a later search resumes at that identifier.

use crate::error::{DiscoveryError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Token form of an identifier, as carried in cursors and by the CLI.
///
/// The token uses the URL-safe alphabet and never ends in `=`, so it can sit
/// in a query string unescaped. Cursor tokens are produced here.
///
/// ```
/// use aas_discovery_core::encode_id_base64url;
///
/// // The next page starts at "urn:b"
/// assert_eq!(encode_id_base64url("urn:b"), "dXJuOmI");
/// ```
#[must_use]
pub fn encode_id_base64url(id: &str) -> String {
    URL_SAFE_NO_PAD.encode(id.as_bytes())
}

/// Identifier behind a token made by [`encode_id_base64url`].
///
/// # Errors
///
/// Returns [`EncodingError`] when the token has characters outside the
/// URL-safe alphabet, carries padding, or decodes to bytes that are not UTF-8.
///
/// ```
/// use aas_discovery_core::decode_id_base64url;
///
/// assert_eq!(decode_id_base64url("dXJuOmI").unwrap(), "urn:b");
/// assert!(decode_id_base64url("dXJuOmI=").is_err());
/// ```
pub fn decode_id_base64url(token: &str) -> std::result::Result<String, EncodingError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| EncodingError::Base64Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| EncodingError::Utf8Decode(e.to_string()))
}

/// Why a token could not be turned back into an identifier.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EncodingError {
    /// Not unpadded base64url
    #[error("token is not unpadded base64url: {0}")]
    Base64Decode(String),
    /// Decoded bytes are not an identifier string
    #[error("token does not decode to UTF-8: {0}")]
    Utf8Decode(String),
}

/// Resume point in the sorted identifier sequence of a search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor {
    next_id: String,
}

impl Cursor {
    /// Cursor resuming at `next_id` (inclusive).
    #[must_use]
    pub fn at(next_id: impl Into<String>) -> Self {
        Self {
            next_id: next_id.into(),
        }
    }

    /// Parse an incoming cursor token.
    ///
    /// An absent or empty token means "start from the beginning".
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the token does not decode to a non-empty
    /// identifier.
    pub fn parse(token: Option<&str>) -> Result<Option<Self>> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        let next_id = decode_id_base64url(token)
            .map_err(|e| DiscoveryError::InvalidInput(format!("malformed cursor: {e}")))?;
        if next_id.is_empty() {
            return Err(DiscoveryError::InvalidInput(
                "malformed cursor: empty identifier".to_string(),
            ));
        }

        Ok(Some(Self { next_id }))
    }

    /// The first identifier of the page this cursor points at.
    #[must_use]
    pub fn next_id(&self) -> &str {
        &self.next_id
    }

    /// Opaque token handed back to clients.
    #[must_use]
    pub fn encode(&self) -> String {
        encode_id_base64url(&self.next_id)
    }
}
