//! Shared data model for policy verdicts, cache entries, and outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};

/// A category of content that must never reach the remote cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockCategory {
    Credential,
    Identifier,
    Temporal,
    PersonalContext,
}

impl BlockCategory {
    /// Fixed evaluation order for the classifier. Credentials must never
    /// be masked by a weaker match, so the ordering is policy, not a
    /// performance detail.
    pub const EVALUATION_ORDER: [BlockCategory; 4] = [
        BlockCategory::Credential,
        BlockCategory::Identifier,
        BlockCategory::Temporal,
        BlockCategory::PersonalContext,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credential => "credential",
            Self::Identifier => "identifier",
            Self::Temporal => "temporal",
            Self::PersonalContext => "personal_context",
        }
    }
}

impl fmt::Display for BlockCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict returned by the content classifier.
///
/// Invariant: `blocked == false` iff `category` is `None`. Construct
/// through [`ClassificationVerdict::pass`] and
/// [`ClassificationVerdict::block`] to keep the two in sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationVerdict {
    /// Whether the text matched a hard-block rule.
    pub blocked: bool,
    /// The matched block category, present iff `blocked`.
    pub category: Option<BlockCategory>,
    /// Identifier of the rule that triggered the block, for observability.
    pub matched_rule: Option<String>,
}

impl ClassificationVerdict {
    /// Create a passing verdict.
    pub fn pass() -> Self {
        Self {
            blocked: false,
            category: None,
            matched_rule: None,
        }
    }

    /// Create a blocking verdict.
    pub fn block(category: BlockCategory, rule: impl Into<String>) -> Self {
        Self {
            blocked: true,
            category: Some(category),
            matched_rule: Some(rule.into()),
        }
    }

    /// Category and rule id when blocked, `None` otherwise.
    pub fn block_details(&self) -> Option<(BlockCategory, &str)> {
        match (self.blocked, self.category, self.matched_rule.as_deref()) {
            (true, Some(category), Some(rule)) => Some((category, rule)),
            _ => None,
        }
    }
}

/// Whitelist category a cacheable prompt resolves into. Each maps to a
/// fixed similarity threshold; `Unclassified` is the conservative default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhitelistCategory {
    FactualQa,
    DefinitionDocs,
    CommandExplanation,
    ReplyTemplate,
    StyleTransform,
    Unclassified,
}

impl WhitelistCategory {
    /// Minimum similarity score required for a lookup in this category.
    pub fn threshold(&self) -> f64 {
        match self {
            Self::FactualQa => 0.90,
            Self::DefinitionDocs => 0.90,
            Self::CommandExplanation => 0.92,
            Self::ReplyTemplate => 0.88,
            Self::StyleTransform => 0.85,
            Self::Unclassified => 0.90,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FactualQa => "factual_qa",
            Self::DefinitionDocs => "definition_docs",
            Self::CommandExplanation => "command_explanation",
            Self::ReplyTemplate => "reply_template",
            Self::StyleTransform => "style_transform",
            Self::Unclassified => "unclassified",
        }
    }

    /// Parse a category name as written in entry attributes.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "factual_qa" => Some(Self::FactualQa),
            "definition_docs" => Some(Self::DefinitionDocs),
            "command_explanation" => Some(Self::CommandExplanation),
            "reply_template" => Some(Self::ReplyTemplate),
            "style_transform" => Some(Self::StyleTransform),
            "unclassified" => Some(Self::Unclassified),
            _ => None,
        }
    }
}

impl fmt::Display for WhitelistCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in the remote cache.
///
/// The id and timestamp are assigned by the remote service; the gateway
/// never persists entries locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub id: String,
    pub prompt: String,
    pub response: String,
    /// Key/value tags used for filtering and bulk deletion.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

/// A search hit with its similarity score, in remote-given order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMatch {
    pub entry: CacheEntry,
    pub similarity: f64,
}

/// Per-request composition of verdict, category, and threshold.
///
/// Constructed for one request and discarded; carries no state across
/// calls and is never persisted.
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub verdict: ClassificationVerdict,
    pub category: WhitelistCategory,
    pub threshold: f64,
}

/// Target of a delete operation: exactly one of an entry id or an
/// attribute filter.
#[derive(Debug, Clone)]
pub enum DeleteSelector {
    ById(String),
    ByAttributes(HashMap<String, String>),
}

impl DeleteSelector {
    /// Build a selector from optional parts.
    ///
    /// Supplying both or neither is a usage error; this is the single
    /// place the exactly-one rule is enforced.
    pub fn from_parts(
        id: Option<String>,
        attributes: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        match (id, attributes) {
            (Some(_), Some(_)) => Err(Error::usage(
                "delete takes an entry id or an attribute filter, not both",
            )),
            (Some(id), None) => Ok(Self::ById(id)),
            (None, Some(attrs)) if !attrs.is_empty() => Ok(Self::ByAttributes(attrs)),
            (None, Some(_)) => Err(Error::usage("attribute filter must not be empty")),
            (None, None) => Err(Error::usage(
                "delete requires an entry id or an attribute filter",
            )),
        }
    }
}

/// Outcome of an enforced search.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// The query matched a hard-block rule; nothing was sent over the wire.
    Blocked {
        category: BlockCategory,
        matched_rule: String,
    },
    /// The search was dispatched. Carries the resolved category and
    /// effective threshold for observability.
    Completed {
        matches: Vec<SearchMatch>,
        category: WhitelistCategory,
        threshold: f64,
    },
}

/// Outcome of an enforced store.
#[derive(Debug, Clone)]
pub enum StoreOutcome {
    /// The prompt or the response matched a hard-block rule.
    Blocked {
        category: BlockCategory,
        matched_rule: String,
    },
    /// The entry was stored under the resolved whitelist category.
    Stored {
        id: String,
        category: WhitelistCategory,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_constructors_keep_invariant() {
        let pass = ClassificationVerdict::pass();
        assert!(!pass.blocked);
        assert!(pass.category.is_none());
        assert!(pass.block_details().is_none());

        let block = ClassificationVerdict::block(BlockCategory::Credential, "credential_keyword");
        assert!(block.blocked);
        let (category, rule) = block.block_details().unwrap();
        assert_eq!(category, BlockCategory::Credential);
        assert_eq!(rule, "credential_keyword");
    }

    #[test]
    fn threshold_table_is_exact() {
        assert_eq!(WhitelistCategory::FactualQa.threshold(), 0.90);
        assert_eq!(WhitelistCategory::DefinitionDocs.threshold(), 0.90);
        assert_eq!(WhitelistCategory::CommandExplanation.threshold(), 0.92);
        assert_eq!(WhitelistCategory::ReplyTemplate.threshold(), 0.88);
        assert_eq!(WhitelistCategory::StyleTransform.threshold(), 0.85);
        assert_eq!(WhitelistCategory::Unclassified.threshold(), 0.90);
    }

    #[test]
    fn evaluation_order_puts_credentials_first() {
        assert_eq!(
            BlockCategory::EVALUATION_ORDER[0],
            BlockCategory::Credential
        );
        assert_eq!(
            BlockCategory::EVALUATION_ORDER[3],
            BlockCategory::PersonalContext
        );
    }

    #[test]
    fn delete_selector_requires_exactly_one_part() {
        let attrs = HashMap::from([("model".to_string(), "gpt-4".to_string())]);

        assert!(matches!(
            DeleteSelector::from_parts(Some("e1".into()), None),
            Ok(DeleteSelector::ById(_))
        ));
        assert!(matches!(
            DeleteSelector::from_parts(None, Some(attrs.clone())),
            Ok(DeleteSelector::ByAttributes(_))
        ));
        assert!(matches!(
            DeleteSelector::from_parts(Some("e1".into()), Some(attrs)),
            Err(Error::Usage(_))
        ));
        assert!(matches!(
            DeleteSelector::from_parts(None, None),
            Err(Error::Usage(_))
        ));
        assert!(matches!(
            DeleteSelector::from_parts(None, Some(HashMap::new())),
            Err(Error::Usage(_))
        ));
    }
}
