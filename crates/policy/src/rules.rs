//! Hard-block pattern sets, kept as data.
//!
//! Rule sets are loaded once at process start and immutable afterwards.
//! The builtin set covers the four block categories; operators can replace
//! it with a YAML file so policy updates do not require a rebuild.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

use cachewarden_core::{BlockCategory, Error, Result};

/// On-disk rule file format: one named pattern list per block category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleFile {
    pub version: String,
    #[serde(default)]
    pub credential: Vec<BlockRule>,
    #[serde(default)]
    pub identifier: Vec<BlockRule>,
    #[serde(default)]
    pub temporal: Vec<BlockRule>,
    #[serde(default)]
    pub personal_context: Vec<BlockRule>,
}

/// A single named pattern. Patterns are compiled case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRule {
    pub id: String,
    pub pattern: String,
}

impl BlockRule {
    fn new(id: &str, pattern: &str) -> Self {
        Self {
            id: id.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

impl RuleFile {
    /// The builtin hard-block rules.
    ///
    /// These deliberately match on the presence of sensitive-shaped
    /// content, not intent: "how do I rotate an API key" blocks just like
    /// an actual key would.
    pub fn builtin() -> Self {
        Self {
            version: "1".to_string(),
            credential: vec![
                BlockRule::new(
                    "credential_keyword",
                    r"\b(api[\s_-]?key|access[\s_-]?key|secret[\s_-]?key|private[\s_-]?key|client[\s_-]?secret|passwords?|passphrase|credentials?|auth[\s_-]?token|refresh[\s_-]?token|bearer|otp|2fa|two[\s-]?factor|one[\s-]?time\s+(code|password))\b",
                ),
                BlockRule::new(
                    "credential_assignment",
                    r"[\w-]*(key|token|secret|password|passwd|pwd)\s*[:=]\s*\S{6,}",
                ),
                BlockRule::new("secret_prefix_token", r"\b(sk|pk|rk|ghp|xox[a-z])-[A-Za-z0-9]{8,}"),
                BlockRule::new(
                    "high_entropy_token",
                    r"(key|token|secret|password).{0,16}[A-Za-z0-9+/=_:-]{24,}",
                ),
            ],
            identifier: vec![
                BlockRule::new("email", r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}"),
                BlockRule::new("phone", r"\b(\+\d{1,3}[\s-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b"),
                BlockRule::new(
                    "uuid",
                    r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b",
                ),
                BlockRule::new(
                    "account_id",
                    r"\b(acct|account|customer|cust|member|employee)[\s_#:-]*(id|no|num|number)?[\s_#:-]*\d{4,}\b",
                ),
            ],
            temporal: vec![
                BlockRule::new(
                    "relative_day",
                    r"\b(today|tomorrow|yesterday|tonight|this\s+(morning|afternoon|evening|week|weekend|month)|next\s+(week|month|year|mon(day)?|tue(sday)?|wed(nesday)?|thu(rsday)?|fri(day)?|sat(urday)?|sun(day)?))\b",
                ),
                BlockRule::new(
                    "relative_duration",
                    r"\bin\s+\d+\s+(second|minute|hour|day|week|month)s?\b",
                ),
                BlockRule::new(
                    "schedule_phrase",
                    r"\b(remind me|reminder|deadline|due (date|by|on|at)|appointment|calendar|schedule|reschedule|meeting (at|on))\b",
                ),
                BlockRule::new("clock_time", r"\b\d{1,2}(:\d{2})?\s?(am|pm)\b"),
                // "May" is left out of the month list: it collides with the
                // modal verb far more often than it names a date.
                BlockRule::new(
                    "absolute_date",
                    r"\b\d{4}-\d{2}-\d{2}\b|\b(jan(uary)?|feb(ruary)?|mar(ch)?|apr(il)?|june?|july?|aug(ust)?|sep(t|tember)?|oct(ober)?|nov(ember)?|dec(ember)?)\.?\s+\d{1,2}\b",
                ),
            ],
            personal_context: vec![
                BlockRule::new(
                    "relational_disclosure",
                    r"\b(my|our)\s+(wife|husband|partner|girlfriend|boyfriend|boss|manager|coworker|colleague|friend|roommate|neighbor|mom|mother|dad|father|parents|sister|brother|son|daughter|kids?|children|doctor|therapist|lawyer)\b.{0,80}\b(said|says|told|tells|asked|asks|mentioned|confided|thinks|wants|complained|texted)\b|\b(said|told|mentioned|confided)\b.{0,80}\b(my|our)\s+(wife|husband|partner|boss|manager|mom|dad|friend)\b",
                ),
                BlockRule::new(
                    "private_marker",
                    r"\b(don'?t tell (anyone|anybody)|between (you and me|us)|in confidence|keep (this|it) (private|secret|a secret|between us)|private conversation|off the record)\b",
                ),
            ],
        }
    }

    /// Parse a rule file from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::configuration(format!("invalid rule file: {e}")))
    }
}

struct CompiledRule {
    id: String,
    regex: Regex,
}

/// Compiled, immutable rule set evaluated by the classifier.
pub struct RuleSet {
    credential: Vec<CompiledRule>,
    identifier: Vec<CompiledRule>,
    temporal: Vec<CompiledRule>,
    personal_context: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile the builtin rules. These patterns are static and known-good.
    pub fn builtin() -> Self {
        Self::compile(&RuleFile::builtin()).unwrap()
    }

    /// Compile a rule file, rejecting invalid patterns.
    pub fn compile(file: &RuleFile) -> Result<Self> {
        Ok(Self {
            credential: compile_rules(&file.credential)?,
            identifier: compile_rules(&file.identifier)?,
            temporal: compile_rules(&file.temporal)?,
            personal_context: compile_rules(&file.personal_context)?,
        })
    }

    /// Load and compile a YAML rule file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(format!("failed to read rule file {:?}: {e}", path)))?;
        let file = RuleFile::from_yaml(&content)?;
        let set = Self::compile(&file)?;
        tracing::info!(path = %path.display(), version = %file.version, "loaded block rule file");
        Ok(set)
    }

    /// Id of the first rule in `category` matching `text`, if any.
    pub fn first_match(&self, category: BlockCategory, text: &str) -> Option<&str> {
        self.rules_for(category)
            .iter()
            .find(|r| r.regex.is_match(text))
            .map(|r| r.id.as_str())
    }

    fn rules_for(&self, category: BlockCategory) -> &[CompiledRule] {
        match category {
            BlockCategory::Credential => &self.credential,
            BlockCategory::Identifier => &self.identifier,
            BlockCategory::Temporal => &self.temporal,
            BlockCategory::PersonalContext => &self.personal_context,
        }
    }
}

fn compile_rules(rules: &[BlockRule]) -> Result<Vec<CompiledRule>> {
    rules
        .iter()
        .map(|r| {
            let regex = RegexBuilder::new(&r.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    Error::configuration(format!("invalid pattern for rule '{}': {e}", r.id))
                })?;
            Ok(CompiledRule {
                id: r.id.clone(),
                regex,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_rules_compile() {
        let set = RuleSet::builtin();
        assert_eq!(
            set.first_match(BlockCategory::Identifier, "mail me at a@b.co"),
            Some("email")
        );
    }

    #[test]
    fn yaml_rule_file_parses_and_compiles() {
        let yaml = r#"
version: "7"
credential:
  - id: internal_ticket
    pattern: 'WARDEN-\d+'
"#;
        let file = RuleFile::from_yaml(yaml).unwrap();
        assert_eq!(file.version, "7");
        let set = RuleSet::compile(&file).unwrap();
        assert_eq!(
            set.first_match(BlockCategory::Credential, "see warden-1234"),
            Some("internal_ticket")
        );
        assert_eq!(set.first_match(BlockCategory::Temporal, "tomorrow"), None);
    }

    #[test]
    fn invalid_pattern_is_a_configuration_error() {
        let file = RuleFile {
            version: "1".into(),
            credential: vec![BlockRule::new("broken", r"([unclosed")],
            identifier: vec![],
            temporal: vec![],
            personal_context: vec![],
        };
        assert!(matches!(
            RuleSet::compile(&file),
            Err(Error::Configuration(_))
        ));
    }
}
