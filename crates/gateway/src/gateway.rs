//! The policy gateway orchestrator.

use std::collections::HashMap;
use std::sync::Arc;

use cachewarden_core::{
    BlockCategory, CacheService, ClassificationVerdict, DeleteSelector, PolicyDecision, Result,
    SearchOutcome, StoreOutcome,
};
use cachewarden_policy::{effective_threshold, CategoryResolver, Classifier};

/// Policy-enforcing front of the remote semantic cache.
///
/// Every operation is an independent, stateless request: nothing is
/// retained across calls and concurrent invocations share no mutable
/// state, so callers may run operations in parallel freely.
pub struct PolicyGateway {
    classifier: Classifier,
    resolver: CategoryResolver,
    cache: Arc<dyn CacheService>,
    allow_override_below_floor: bool,
}

impl PolicyGateway {
    /// Create a gateway over the given transport with builtin rules.
    pub fn new(cache: Arc<dyn CacheService>) -> Self {
        Self {
            classifier: Classifier::builtin(),
            resolver: CategoryResolver::new(),
            cache,
            allow_override_below_floor: false,
        }
    }

    /// Replace the classifier (e.g. with one built from an operator rule
    /// file).
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Permit search overrides below the category threshold floor.
    pub fn with_allow_override_below_floor(mut self, allow: bool) -> Self {
        self.allow_override_below_floor = allow;
        self
    }

    /// Classify every text before anything can touch the network.
    ///
    /// This is the single preflight funnel for all enforced operations;
    /// new operations must route through it rather than re-implementing
    /// the check.
    fn preflight(&self, texts: &[(&str, &str)]) -> Option<(BlockCategory, String)> {
        for (field, text) in texts.iter().copied() {
            let verdict = self.classifier.classify(text);
            if let Some((category, rule)) = verdict.block_details() {
                tracing::info!(
                    field,
                    category = %category,
                    rule,
                    "hard block, refusing to dispatch"
                );
                return Some((category, rule.to_string()));
            }
        }
        None
    }

    /// Classification only. Never touches the network.
    pub fn check(&self, text: &str) -> ClassificationVerdict {
        self.classifier.classify(text)
    }

    /// Resolve the policy decision for a cacheable text.
    fn decide(
        &self,
        text: &str,
        metadata: Option<&HashMap<String, String>>,
        override_threshold: Option<f64>,
    ) -> PolicyDecision {
        let (category, _) = self.resolver.resolve(text, metadata);
        let threshold =
            effective_threshold(category, override_threshold, self.allow_override_below_floor);
        PolicyDecision {
            verdict: ClassificationVerdict::pass(),
            category,
            threshold,
        }
    }

    /// Enforced similarity search.
    ///
    /// Blocked queries return without any network call so sensitive text
    /// cannot leak into the remote service's logs or embeddings.
    pub async fn search(
        &self,
        query: &str,
        override_threshold: Option<f64>,
        attribute_filter: Option<&HashMap<String, String>>,
    ) -> Result<SearchOutcome> {
        if let Some((category, matched_rule)) = self.preflight(&[("query", query)]) {
            return Ok(SearchOutcome::Blocked {
                category,
                matched_rule,
            });
        }

        let decision = self.decide(query, None, override_threshold);
        tracing::debug!(
            category = %decision.category,
            threshold = decision.threshold,
            "dispatching cache search"
        );
        let matches = self
            .cache
            .search(query, decision.threshold, attribute_filter)
            .await?;
        tracing::debug!(matches = matches.len(), "cache search completed");

        Ok(SearchOutcome::Completed {
            matches,
            category: decision.category,
            threshold: decision.threshold,
        })
    }

    /// Enforced store.
    ///
    /// Both the prompt and the response are classified: an LLM response
    /// can echo a secret even when the prompt was clean.
    pub async fn store(
        &self,
        prompt: &str,
        response: &str,
        attributes: Option<&HashMap<String, String>>,
    ) -> Result<StoreOutcome> {
        let texts = [("prompt", prompt), ("response", response)];
        if let Some((category, matched_rule)) = self.preflight(&texts) {
            return Ok(StoreOutcome::Blocked {
                category,
                matched_rule,
            });
        }

        let decision = self.decide(prompt, attributes, None);
        let mut attributes = attributes.cloned().unwrap_or_default();
        attributes.insert("category".to_string(), decision.category.to_string());

        tracing::debug!(category = %decision.category, "dispatching cache store");
        let id = self.cache.store(prompt, response, &attributes).await?;

        Ok(StoreOutcome::Stored {
            id,
            category: decision.category,
        })
    }

    /// Delete by id or attribute filter. Deleting is always safe, so this
    /// is a pass-through; argument validation happened when the selector
    /// was built.
    pub async fn delete(&self, selector: &DeleteSelector) -> Result<u64> {
        let deleted = self.cache.delete(selector).await?;
        tracing::debug!(deleted, "cache delete completed");
        Ok(deleted)
    }

    /// Clear all entries. Pass-through.
    pub async fn flush(&self) -> Result<u64> {
        let deleted = self.cache.flush().await?;
        tracing::info!(deleted, "cache flushed");
        Ok(deleted)
    }
}
