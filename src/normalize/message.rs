//! Clean-message extraction from a raw log line.
//!
//! Applied in order until one step produces a result: a JSON-ish field
//! probe, a severity-prefix match, an ISO-timestamp-and-level strip, and
//! finally a truncated raw fallback.

use regex::Regex;
use std::sync::LazyLock;

const MAX_FALLBACK_LEN: usize = 500;

const FIELD_PROBE_ORDER: [&str; 4] = ["message", "msg", "error", "err"];

static FIELD_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    FIELD_PROBE_ORDER
        .iter()
        .map(|field| {
            let pattern = format!(r#""{field}"\s*:\s*"((?:[^"\\]|\\.)*)""#);
            (*field, Regex::new(&pattern).expect("static field probe pattern"))
        })
        .collect()
});

static SEVERITY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:error|fatal|panic|exception|fail(?:ed|ure)?)\b[:\s]+(.+)").unwrap());

static TIMESTAMP_LEVEL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?\s+(?:\[?[A-Za-z]+\]?\s*[:\-]?\s*)?(.+)$")
        .unwrap()
});

/// Unescape the minimal `\"` / `\\` sequences a naive field probe can leave
/// behind (full JSON parsing is explicitly not required here).
fn unescape_json_ish(s: &str) -> String {
    s.replace("\\\"", "\"").replace("\\\\", "\\")
}

/// Derive a clean, single-line message from a raw log line.
pub fn extract_message(raw: &str) -> String {
    for (_, pattern) in FIELD_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(raw) {
            if let Some(value) = caps.get(1) {
                let value = value.as_str().trim();
                if !value.is_empty() {
                    return unescape_json_ish(value);
                }
            }
        }
    }

    if let Some(caps) = SEVERITY_PREFIX.captures(raw) {
        if let Some(rest) = caps.get(1) {
            let rest = rest.as_str().trim();
            if !rest.is_empty() {
                return rest.to_string();
            }
        }
    }

    if let Some(caps) = TIMESTAMP_LEVEL_PREFIX.captures(raw) {
        if let Some(rest) = caps.get(1) {
            let rest = rest.as_str().trim();
            if !rest.is_empty() {
                return rest.to_string();
            }
        }
    }

    truncate_with_ellipsis(raw.trim(), MAX_FALLBACK_LEN)
}

fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max).collect();
    format!("{truncated}...")
}
