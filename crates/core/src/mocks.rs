//! Mock implementations of core traits for testing.
//!
//! Used across the workspace so gateway and system tests can assert on
//! call counts (in particular: that blocked content never triggers a
//! cache call) without a live remote service.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::Result;
use crate::traits::CacheService;
use crate::types::{CacheEntry, DeleteSelector, SearchMatch};

/// In-memory stand-in for the remote cache service.
///
/// Similarity is word overlap (Jaccard) over lowercased alphanumeric
/// tokens, which is enough to make store-then-search behave like a
/// similarity index in tests: identical prompts score 1.0 and unrelated
/// prompts score near 0.0.
pub struct MockCacheService {
    entries: Mutex<Vec<CacheEntry>>,
    calls: Mutex<CallCounts>,
}

/// Per-operation call counters.
#[derive(Debug, Default, Clone)]
pub struct CallCounts {
    pub search: usize,
    pub store: usize,
    pub delete: usize,
    pub flush: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.search + self.store + self.delete + self.flush
    }
}

impl MockCacheService {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            calls: Mutex::new(CallCounts::default()),
        }
    }

    /// Number of calls made to this mock, per operation.
    pub fn call_counts(&self) -> CallCounts {
        self.calls.lock().unwrap().clone()
    }

    /// Snapshot of the stored entries.
    pub fn entries(&self) -> Vec<CacheEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn tokens(text: &str) -> HashSet<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn similarity(a: &str, b: &str) -> f64 {
        let ta = Self::tokens(a);
        let tb = Self::tokens(b);
        if ta.is_empty() || tb.is_empty() {
            return 0.0;
        }
        let intersection = ta.intersection(&tb).count() as f64;
        let union = ta.union(&tb).count() as f64;
        intersection / union
    }

    fn matches_filter(entry: &CacheEntry, filter: &HashMap<String, String>) -> bool {
        filter
            .iter()
            .all(|(k, v)| entry.attributes.get(k) == Some(v))
    }
}

impl Default for MockCacheService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for MockCacheService {
    async fn search(
        &self,
        query: &str,
        threshold: f64,
        attribute_filter: Option<&HashMap<String, String>>,
    ) -> Result<Vec<SearchMatch>> {
        self.calls.lock().unwrap().search += 1;

        let entries = self.entries.lock().unwrap();
        let mut matches: Vec<SearchMatch> = entries
            .iter()
            .filter(|e| attribute_filter.map_or(true, |f| Self::matches_filter(e, f)))
            .filter_map(|e| {
                let similarity = Self::similarity(query, &e.prompt);
                (similarity >= threshold).then(|| SearchMatch {
                    entry: e.clone(),
                    similarity,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(matches)
    }

    async fn store(
        &self,
        prompt: &str,
        response: &str,
        attributes: &HashMap<String, String>,
    ) -> Result<String> {
        self.calls.lock().unwrap().store += 1;

        let id = Uuid::new_v4().to_string();
        self.entries.lock().unwrap().push(CacheEntry {
            id: id.clone(),
            prompt: prompt.to_string(),
            response: response.to_string(),
            attributes: attributes.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn delete(&self, selector: &DeleteSelector) -> Result<u64> {
        self.calls.lock().unwrap().delete += 1;

        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        match selector {
            DeleteSelector::ById(id) => entries.retain(|e| &e.id != id),
            DeleteSelector::ByAttributes(filter) => {
                entries.retain(|e| !Self::matches_filter(e, filter))
            }
        }
        Ok((before - entries.len()) as u64)
    }

    async fn flush(&self) -> Result<u64> {
        self.calls.lock().unwrap().flush += 1;

        let mut entries = self.entries.lock().unwrap();
        let removed = entries.len() as u64;
        entries.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_prompt_is_top_match() {
        let mock = MockCacheService::new();
        mock.store("What is Redis?", "An in-memory data store.", &HashMap::new())
            .await
            .unwrap();
        mock.store("How do lifetimes work?", "...", &HashMap::new())
            .await
            .unwrap();

        let matches = mock.search("what is redis", 0.9, None).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].entry.response, "An in-memory data store.");
        assert!(matches[0].similarity >= 0.9);
    }

    #[tokio::test]
    async fn delete_unknown_id_reports_zero() {
        let mock = MockCacheService::new();
        let removed = mock
            .delete(&DeleteSelector::ById("no-such-id".into()))
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn attribute_delete_removes_only_matching() {
        let mock = MockCacheService::new();
        let tagged = HashMap::from([("model".to_string(), "m1".to_string())]);
        mock.store("a", "1", &tagged).await.unwrap();
        mock.store("b", "2", &HashMap::new()).await.unwrap();

        let removed = mock
            .delete(&DeleteSelector::ByAttributes(tagged))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(mock.len(), 1);
    }
}
