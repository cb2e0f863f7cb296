//! Deterministic error fingerprinting.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

use super::podname::pod_base;

static ISO_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?").unwrap());

static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap()
});

static LONG_HEX_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b[0-9a-f]{24,}\b").unwrap());

static IPV4_WITH_PORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}(?::\d+)?\b").unwrap());

static LONG_DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{6,}\b").unwrap());

/// Replace time-varying noise in a message with stable placeholder tokens
/// so identical errors fingerprint the same way across occurrences.
///
/// Order matters: UUIDs and long hex ids must be substituted before the
/// digit-run pass would otherwise partially match their numeric segments.
pub fn normalize_message(message: &str) -> String {
    let s = ISO_TIMESTAMP.replace_all(message, "<TIMESTAMP>");
    let s = UUID.replace_all(&s, "<UUID>");
    let s = LONG_HEX_ID.replace_all(&s, "<ID>");
    let s = IPV4_WITH_PORT.replace_all(&s, "<IP>");
    let s = LONG_DIGIT_RUN.replace_all(&s, "<NUM>");
    s.trim().to_string()
}

/// Compute the short deterministic fingerprint for an error
/// (first 8 bytes of SHA-256, hex-encoded) of
/// `namespace|podBase|container|normalizedMessage`.
pub fn fingerprint(namespace: &str, pod: &str, container: &str, message: &str) -> String {
    let base = pod_base(pod);
    let normalized = normalize_message(message);
    let input = format!("{namespace}|{base}|{container}|{normalized}");

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_stable_across_replicas_of_a_statefulset() {
        let a = fingerprint("prod", "api-0", "app", "OOMKilled: container exceeded memory limit");
        let b = fingerprint("prod", "api-1", "app", "OOMKilled: container exceeded memory limit");
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_invariant_under_uuid_and_timestamp_noise() {
        let a = fingerprint(
            "prod",
            "web-7d4f8b9c5d-abc12",
            "app",
            "2024-01-01T10:00:00Z request 3f29b1d4-6c2a-4e55-9c11-2a6e9d9b0a11 failed",
        );
        let b = fingerprint(
            "prod",
            "web-7d4f8b9c5d-xyz99",
            "app",
            "2024-06-05T03:11:09Z request 9a8b7c6d-1234-4e55-9c11-000000000000 failed",
        );
        assert_eq!(a, b);
    }

    #[test]
    fn short_numbers_like_status_codes_are_preserved() {
        let normalized = normalize_message("request failed with status 503");
        assert_eq!(normalized, "request failed with status 503");
    }

    #[test]
    fn long_digit_runs_are_replaced() {
        let normalized = normalize_message("pid 123456789 exited");
        assert_eq!(normalized, "pid <NUM> exited");
    }

    #[test]
    fn normalize_message_is_idempotent() {
        let msg = "2024-01-01T10:00:00Z conn 10.0.0.5:8080 id 3f29b1d46c2a4e559c112a6e9d9b0a11 count 123456789";
        let once = normalize_message(msg);
        let twice = normalize_message(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn ipv4_with_port_is_replaced() {
        assert_eq!(normalize_message("connect to 10.0.0.5:8080 failed"), "connect to <IP> failed");
    }
}
