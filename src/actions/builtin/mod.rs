//! Built-in action set.

pub mod delete_stuck_pods;
pub mod none;
pub mod restart_pod;
pub mod rollback;
pub mod scale;

/// Parse a `replicas` parameter that is either an absolute value (`"5"`)
/// or a relative delta (`"+2"`, `"-1"`) against a current value.
pub(crate) fn resolve_replicas(current: i32, raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if let Some(delta) = raw.strip_prefix('+') {
        return delta.parse::<i32>().ok().map(|d| current + d);
    }
    if let Some(delta) = raw.strip_prefix('-') {
        return delta.parse::<i32>().ok().map(|d| current - d);
    }
    raw.parse::<i32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_value() {
        assert_eq!(resolve_replicas(3, "5"), Some(5));
    }

    #[test]
    fn relative_increment() {
        assert_eq!(resolve_replicas(3, "+2"), Some(5));
    }

    #[test]
    fn relative_decrement() {
        assert_eq!(resolve_replicas(3, "-2"), Some(1));
    }

    #[test]
    fn empty_string_is_unparseable() {
        assert_eq!(resolve_replicas(3, ""), None);
    }
}
