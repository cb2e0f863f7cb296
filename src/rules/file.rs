//! Rule file — TOML `[[rule]]` array deserialization and compilation.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use grep_regex::RegexMatcher;
use serde::Deserialize;
use thiserror::Error;

use crate::model::rule::{LabelMatch, MatchSpec, NamespaceMatch, Priority, RemediationSpec, Rule};
use crate::actions::NONE_ACTION;

#[derive(Debug, Error)]
pub enum RuleFileError {
    #[error("failed to read rule file {0}: {1}")]
    Read(String, std::io::Error),
    #[error("failed to parse rule file {0}: {1}")]
    Parse(String, toml::de::Error),
    #[error("failed to compile rule '{0}': {1}")]
    InvalidPattern(String, String),
    #[error("rule '{0}' must set at least one of pattern or keywords")]
    NoMatchCriteria(String),
    #[error("rule name must not be empty")]
    EmptyName,
    #[error("rule '{0}' has an unknown priority: {1}")]
    UnknownPriority(String, String),
    #[error("rule '{0}' has an invalid cooldown duration '{1}': {2}")]
    InvalidCooldown(String, String, humantime::DurationError),
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(rename = "rule", default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize, Default)]
struct RawRule {
    name: String,
    #[serde(rename = "match", default)]
    match_spec: RawMatchSpec,
    priority: String,
    #[serde(default)]
    remediation: Option<RawRemediation>,
    #[serde(default = "default_true")]
    enabled: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Default)]
struct RawMatchSpec {
    pattern: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    labels: HashMap<String, String>,
    #[serde(default)]
    namespaces: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawRemediation {
    #[serde(default = "default_action")]
    action: String,
    #[serde(default)]
    params: HashMap<String, String>,
    #[serde(default = "default_cooldown")]
    cooldown: String,
}

fn default_action() -> String {
    NONE_ACTION.to_string()
}

fn default_cooldown() -> String {
    "5m".to_string()
}

/// Parse and compile a rule file. Compilation failures reject the whole
/// set atomically: either every rule compiles, or none are returned.
pub fn load_rule_file(path: &Path) -> Result<Vec<Rule>, RuleFileError> {
    let raw = fs::read_to_string(path).map_err(|e| RuleFileError::Read(path.display().to_string(), e))?;
    parse_rule_file(&raw)
}

pub fn parse_rule_file(toml_source: &str) -> Result<Vec<Rule>, RuleFileError> {
    let file: RuleFile = toml::from_str(toml_source).map_err(|e| RuleFileError::Parse("<string>".into(), e))?;
    file.rules.into_iter().map(compile_rule).collect()
}

fn compile_rule(raw: RawRule) -> Result<Rule, RuleFileError> {
    if raw.name.trim().is_empty() {
        return Err(RuleFileError::EmptyName);
    }

    if raw.match_spec.pattern.is_none() && raw.match_spec.keywords.is_empty() {
        return Err(RuleFileError::NoMatchCriteria(raw.name.clone()));
    }

    let priority = Priority::parse(&raw.priority)
        .ok_or_else(|| RuleFileError::UnknownPriority(raw.name.clone(), raw.priority.clone()))?;

    let pattern = match &raw.match_spec.pattern {
        Some(p) => Some(
            RegexMatcher::new(p)
                .map_err(|e| RuleFileError::InvalidPattern(raw.name.clone(), e.to_string()))?,
        ),
        None => None,
    };

    let labels = raw
        .match_spec
        .labels
        .into_iter()
        .map(|(key, raw_value)| LabelMatch { key, raw_value })
        .collect();

    let match_spec = MatchSpec {
        pattern,
        pattern_source: raw.match_spec.pattern.clone(),
        keywords: raw.match_spec.keywords,
        labels,
        namespaces: NamespaceMatch { entries: raw.match_spec.namespaces },
    };

    let remediation = match raw.remediation {
        None => None,
        Some(r) => {
            let cooldown: Duration = humantime::parse_duration(&r.cooldown)
                .map_err(|e| RuleFileError::InvalidCooldown(raw.name.clone(), r.cooldown.clone(), e))?;
            Some(RemediationSpec { action: r.action, params: r.params, cooldown })
        }
    };

    Ok(Rule { name: raw.name, match_spec, priority, enabled: raw.enabled, remediation })
}
