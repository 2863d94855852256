//! Hard-block content classifier.

use cachewarden_core::{BlockCategory, ClassificationVerdict};

use crate::rules::RuleSet;

/// Deterministic classifier over the hard-block categories.
///
/// Pure: no I/O, no side effects, cannot fail. Categories are evaluated
/// in [`BlockCategory::EVALUATION_ORDER`] and the first match wins, so a
/// text containing both a credential and a time reference classifies as
/// `credential`.
pub struct Classifier {
    rules: RuleSet,
}

impl Classifier {
    /// Create a classifier over the given rule set.
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Create a classifier over the builtin rules.
    pub fn builtin() -> Self {
        Self::new(RuleSet::builtin())
    }

    /// Classify a text. Empty or whitespace-only input passes: there is
    /// no content to block.
    pub fn classify(&self, text: &str) -> ClassificationVerdict {
        if text.trim().is_empty() {
            return ClassificationVerdict::pass();
        }

        for category in BlockCategory::EVALUATION_ORDER {
            if let Some(rule) = self.rules.first_match(category, text) {
                return ClassificationVerdict::block(category, rule);
            }
        }
        ClassificationVerdict::pass()
    }
}
