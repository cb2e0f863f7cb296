//! Rule — match predicate, priority, and remediation spec.

use std::collections::HashMap;
use std::time::Duration;

use grep_regex::RegexMatcher;

use crate::actions::NONE_ACTION;

/// Severity ordering. Lower weight is more urgent; see [`Priority::weight`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Priority {
    P1,
    P2,
    P3,
    P4,
}

impl Priority {
    /// P1=1 … P4=4, lower is more urgent.
    pub fn weight(self) -> u8 {
        match self {
            Priority::P1 => 1,
            Priority::P2 => 2,
            Priority::P3 => 3,
            Priority::P4 => 4,
        }
    }

    /// Parse the accepted textual forms from the rule file:
    /// `P1|p1|critical|CRITICAL`, and the analogous forms for P2–P4.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "p1" | "critical" => Some(Priority::P1),
            "p2" | "high" => Some(Priority::P2),
            "p3" | "medium" => Some(Priority::P3),
            "p4" | "low" => Some(Priority::P4),
            _ => None,
        }
    }
}

/// A single `key: value` label matcher.
///
/// - value starting with `!` → inequality (absence satisfies it)
/// - value starting with `~` → regex match against the label value
/// - otherwise → exact string equality (absent key fails)
#[derive(Debug, Clone)]
pub struct LabelMatch {
    pub key: String,
    pub raw_value: String,
}

impl LabelMatch {
    pub fn matches(&self, labels: &HashMap<String, String>) -> bool {
        if let Some(negated) = self.raw_value.strip_prefix('!') {
            return labels.get(&self.key).map(|v| v != negated).unwrap_or(true);
        }
        if let Some(pattern) = self.raw_value.strip_prefix('~') {
            let matcher = match RegexMatcher::new(pattern) {
                Ok(m) => m,
                Err(_) => return false,
            };
            return labels
                .get(&self.key)
                .map(|v| matches_bytes(&matcher, v.as_bytes()))
                .unwrap_or(false);
        }
        labels.get(&self.key).map(|v| v == &self.raw_value).unwrap_or(false)
    }
}

fn matches_bytes(matcher: &RegexMatcher, haystack: &[u8]) -> bool {
    use grep_matcher::Matcher;
    matcher.is_match(haystack).unwrap_or(false)
}

/// Namespace whitelist entries. An entry starting with `!` is a negation.
#[derive(Debug, Clone, Default)]
pub struct NamespaceMatch {
    pub entries: Vec<String>,
}

impl NamespaceMatch {
    pub fn matches(&self, namespace: &str) -> bool {
        if self.entries.is_empty() {
            return true;
        }
        let (negations, positives): (Vec<&String>, Vec<&String>) =
            self.entries.iter().partition(|e| e.starts_with('!'));

        if positives.is_empty() {
            // every entry is a negation: pass iff none match
            return negations.iter().all(|e| e.trim_start_matches('!') != namespace);
        }

        let positive_hit = positives.iter().any(|e| e.as_str() == namespace);
        let negation_hit = negations.iter().any(|e| e.trim_start_matches('!') == namespace);
        positive_hit && !negation_hit
    }
}

/// The compiled match predicate for a [`Rule`].
pub struct MatchSpec {
    pub pattern: Option<RegexMatcher>,
    pub pattern_source: Option<String>,
    pub keywords: Vec<String>,
    pub labels: Vec<LabelMatch>,
    pub namespaces: NamespaceMatch,
}

impl std::fmt::Debug for MatchSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchSpec")
            .field("pattern_source", &self.pattern_source)
            .field("keywords", &self.keywords)
            .field("labels", &self.labels)
            .field("namespaces", &self.namespaces)
            .finish()
    }
}

impl MatchSpec {
    /// All present clauses must be satisfied (AND).
    pub fn matches(&self, namespace: &str, labels: &HashMap<String, String>, message: &str, raw: &str) -> bool {
        if !self.namespaces.matches(namespace) {
            return false;
        }
        if !self.labels.iter().all(|l| l.matches(labels)) {
            return false;
        }
        if let Some(matcher) = &self.pattern {
            if !matches_bytes(matcher, message.as_bytes()) && !matches_bytes(matcher, raw.as_bytes()) {
                return false;
            }
        }
        if !self.keywords.is_empty() {
            let hay = format!("{message} {raw}").to_lowercase();
            if !self.keywords.iter().any(|kw| hay.contains(&kw.to_lowercase())) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct RemediationSpec {
    /// Registered action name. `"none"` is always a no-op.
    pub action: String,
    pub params: HashMap<String, String>,
    pub cooldown: Duration,
}

impl RemediationSpec {
    pub fn is_none(&self) -> bool {
        self.action == NONE_ACTION
    }
}

impl Default for RemediationSpec {
    fn default() -> Self {
        Self {
            action: NONE_ACTION.to_string(),
            params: HashMap::new(),
            cooldown: Duration::from_secs(5 * 60),
        }
    }
}

/// A compiled, validated rule ready for matching.
#[derive(Debug)]
pub struct Rule {
    pub name: String,
    pub match_spec: MatchSpec,
    pub priority: Priority,
    pub enabled: bool,
    pub remediation: Option<RemediationSpec>,
}
