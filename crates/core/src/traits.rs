//! Trait seam between the policy gateway and the remote cache transport.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;
use crate::types::{DeleteSelector, SearchMatch};

/// Operations offered by the remote semantic cache service.
///
/// Implemented by the HTTP client and mocked in tests; the gateway never
/// talks to the wire directly. Implementations retain no local state
/// between calls beyond standard connection reuse.
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Similarity search. Matches come back in the remote service's
    /// descending-similarity order; an empty result is not an error.
    async fn search(
        &self,
        query: &str,
        threshold: f64,
        attribute_filter: Option<&HashMap<String, String>>,
    ) -> Result<Vec<SearchMatch>>;

    /// Store a new entry and return the remotely assigned id.
    ///
    /// Not idempotent: every call creates a new entry, deduplication is
    /// the remote service's concern.
    async fn store(
        &self,
        prompt: &str,
        response: &str,
        attributes: &HashMap<String, String>,
    ) -> Result<String>;

    /// Delete by id or attribute filter, returning the number of entries
    /// removed. Deleting an unknown id reports zero, not an error.
    async fn delete(&self, selector: &DeleteSelector) -> Result<u64>;

    /// Clear all entries, returning the number removed.
    async fn flush(&self) -> Result<u64>;
}
