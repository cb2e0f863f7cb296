//! Pod-name base extraction: strips workload-generated suffixes so that
//! replicas of the same workload fingerprint identically.

use regex::Regex;
use std::sync::LazyLock;

// deployment pods: name-<8-10 hex>-<5 alnum>
static DEPLOYMENT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)-[0-9a-f]{8,10}-[a-z0-9]{5}$").unwrap());

// statefulset pods: name-<ordinal>
static STATEFULSET_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+)-\d+$").unwrap());

// job pods: name-<5 alnum>
static JOB_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+)-[a-z0-9]{5}$").unwrap());

/// Strip a deployment/statefulset/job pod-name suffix, in that priority
/// order. Names matching none of the three patterns are returned unchanged.
pub fn pod_base(pod_name: &str) -> String {
    if let Some(caps) = DEPLOYMENT_SUFFIX.captures(pod_name) {
        return caps[1].to_string();
    }
    if let Some(caps) = STATEFULSET_SUFFIX.captures(pod_name) {
        return caps[1].to_string();
    }
    if let Some(caps) = JOB_SUFFIX.captures(pod_name) {
        return caps[1].to_string();
    }
    pod_name.to_string()
}
