//! Policy for integration tests that need an embedded PostgreSQL cluster.
//!
//! Embedded PostgreSQL downloads its binaries on first use, which is not
//! possible on every machine. Suites skip with a `SKIP-TEST-CLUSTER` marker
//! unless `PANTRY_REQUIRE_EMBEDDED_POSTGRES` is truthy, in which case a failed
//! bootstrap fails the test so CI breakage is not masked.

const REQUIRE_VAR: &str = "PANTRY_REQUIRE_EMBEDDED_POSTGRES";

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes")
}

/// Returns true when a failed cluster bootstrap must fail the test.
///
/// Truthy values: "1", "true", "yes" (case-insensitive).
pub fn test_cluster_required() -> bool {
    std::env::var(REQUIRE_VAR)
        .map(|value| is_truthy(&value))
        .unwrap_or(false)
}

/// Handles embedded cluster setup failures consistently across suites.
///
/// Prints a skip marker and returns `None`, or panics when the cluster is
/// required.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if test_cluster_required() {
        panic!("Test cluster setup failed: {reason}. Unset {REQUIRE_VAR} to skip.");
    }
    eprintln!("SKIP-TEST-CLUSTER: {reason}");
    None
}

#[cfg(test)]
mod tests {
    //! Unit tests for the skip policy.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("1", true)]
    #[case("TRUE", true)]
    #[case("yes", true)]
    #[case("0", false)]
    #[case("", false)]
    fn truthy_values(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_truthy(value), expected);
    }

    #[rstest]
    fn missing_variable_means_skip() {
        let _guard = env_lock::lock_env([(REQUIRE_VAR, None::<&str>)]);
        assert!(!test_cluster_required());
        assert!(handle_cluster_setup_failure::<()>("no binaries").is_none());
    }
}
