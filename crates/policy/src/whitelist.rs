//! Whitelist category resolution and threshold handling.

use regex::{Regex, RegexBuilder};
use std::collections::HashMap;

use cachewarden_core::WhitelistCategory;

/// Resolves a cacheable prompt into a whitelist category.
///
/// Pure lexical/structural heuristics; only ever invoked on text the
/// classifier has already passed. Unrecognized prompts fall back to
/// `Unclassified`, which carries the most conservative threshold.
pub struct CategoryResolver {
    style_transform: Regex,
    reply_template: Regex,
    command_syntax: Regex,
    definition: Regex,
    question_prefix: Regex,
}

impl CategoryResolver {
    pub fn new() -> Self {
        Self {
            style_transform: build(
                r"^(make (this|it|the)\b|rewrite|reword|rephrase|shorten|simplify|condense|polish|soften|formalize)|\bmake (this|it) (shorter|longer|warmer|friendlier|more \w+|less \w+)\b",
            ),
            reply_template: build(
                r"^(write|draft|compose)\b.{0,60}\b(reply|response|email|message|note|answer)\b|^how (do|should) i (reply|respond)\b",
            ),
            command_syntax: build(r"`[^`]+`|(^|\s)\S+\s--?[a-z][a-z-]*\b|\b(command|flag|option)\b"),
            definition: build(
                r"^(define|definition of)\b|^what does .{1,60} mean\b|\b(documentation|docs) (for|of|on)\b",
            ),
            question_prefix: build(
                r"^(what|who|where|why|how|which|whose|is|are|was|were|does|do|did|can|could|should)\b",
            ),
        }
    }

    /// Resolve a prompt to its category and that category's threshold.
    ///
    /// An explicit, valid `category` tag in the metadata wins over the
    /// lexical heuristics.
    pub fn resolve(
        &self,
        text: &str,
        metadata: Option<&HashMap<String, String>>,
    ) -> (WhitelistCategory, f64) {
        if let Some(category) = metadata
            .and_then(|m| m.get("category"))
            .and_then(|name| WhitelistCategory::parse(name))
        {
            return (category, category.threshold());
        }

        let trimmed = text.trim();
        let category = if trimmed.is_empty() {
            WhitelistCategory::Unclassified
        } else if self.style_transform.is_match(trimmed) {
            WhitelistCategory::StyleTransform
        } else if self.reply_template.is_match(trimmed) {
            WhitelistCategory::ReplyTemplate
        } else if self.command_syntax.is_match(trimmed) {
            WhitelistCategory::CommandExplanation
        } else if self.definition.is_match(trimmed) {
            WhitelistCategory::DefinitionDocs
        } else if self.question_prefix.is_match(trimmed) {
            WhitelistCategory::FactualQa
        } else {
            WhitelistCategory::Unclassified
        };
        (category, category.threshold())
    }
}

impl Default for CategoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn build(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap()
}

/// Apply a caller-supplied override to a category's threshold.
///
/// Overrides are clamped to [0, 1]. Raising the threshold is always
/// allowed; dropping below the category floor weakens match quality and
/// is refused unless `allow_below_floor` is configured.
pub fn effective_threshold(
    category: WhitelistCategory,
    override_threshold: Option<f64>,
    allow_below_floor: bool,
) -> f64 {
    let floor = category.threshold();
    match override_threshold {
        None => floor,
        Some(t) => {
            let t = t.clamp(0.0, 1.0);
            if allow_below_floor {
                t
            } else {
                t.max(floor)
            }
        }
    }
}
