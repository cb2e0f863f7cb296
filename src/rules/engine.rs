//! Rule engine — first-match-wins classification of parsed errors.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::model::rule::{Priority, RemediationSpec, Rule};
use crate::model::{MatchedError, ParsedError};

pub const DEFAULT_RULE_NAME: &str = "default";

/// Matches a [`ParsedError`] against an ordered, RwLock-protected rule set.
/// `update_rules` is the only writer; readers always see a consistent
/// snapshot of the whole rule slice.
pub struct RuleEngine {
    rules: RwLock<Vec<Rule>>,
}

impl RuleEngine {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules: RwLock::new(rules) }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Atomically replace the rule set. Readers in flight at the time of
    /// the call complete against the snapshot they already hold.
    pub fn update_rules(&self, new_rules: Vec<Rule>) {
        let mut rules = self.rules.write().unwrap();
        *rules = new_rules;
    }

    pub fn rule_count(&self) -> usize {
        self.rules.read().unwrap().len()
    }

    /// First rule (in configured order) whose predicate matches a non-
    /// disabled rule. Falls through to a synthetic `"default"`/P4 match.
    pub fn matches(&self, error: &ParsedError) -> MatchedError {
        let rules = self.rules.read().unwrap();
        for rule in rules.iter() {
            if !rule.enabled {
                continue;
            }
            if rule.match_spec.matches(&error.namespace, &error.labels, &error.message, &error.raw_line) {
                return MatchedError::new(error.clone(), rule.priority, rule.name.clone());
            }
        }
        MatchedError::new(error.clone(), Priority::P4, DEFAULT_RULE_NAME.to_string())
    }

    /// Cloned remediation spec for a rule by name, if it has one configured.
    /// `RemediationSpec` is the only part of a rule the dispatcher needs and
    /// the only part that is `Clone` — the compiled pattern never leaves
    /// this lock.
    pub fn remediation_for(&self, rule_name: &str) -> Option<RemediationSpec> {
        self.rules.read().unwrap().iter().find(|r| r.name == rule_name).and_then(|r| r.remediation.clone())
    }

    /// Snapshot of rules for listing via the operator surface.
    pub fn list_rules(&self) -> Vec<RuleSummary> {
        self.rules
            .read()
            .unwrap()
            .iter()
            .map(|r| RuleSummary {
                name: r.name.clone(),
                priority: r.priority,
                enabled: r.enabled,
                has_remediation: r.remediation.as_ref().is_some_and(|rem| !rem.is_none()),
            })
            .collect()
    }
}

/// A read-only view of a rule for the operator surface — does not expose
/// the compiled pattern or label/namespace predicates.
#[derive(Debug, Clone)]
pub struct RuleSummary {
    pub name: String,
    pub priority: Priority,
    pub enabled: bool,
    pub has_remediation: bool,
}

/// Compile a regex pattern against a sample line without registering a
/// rule; backs the operator surface's `test_pattern`.
pub fn test_pattern(pattern: &str, sample: &str) -> Result<bool, PatternError> {
    use grep_matcher::Matcher;
    let matcher = grep_regex::RegexMatcher::new(pattern).map_err(|e| PatternError::Compile(e.to_string()))?;
    Ok(matcher.is_match(sample.as_bytes()).unwrap_or(false))
}

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("invalid pattern: {0}")]
    Compile(String),
}
