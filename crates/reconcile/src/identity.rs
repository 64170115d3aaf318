//! Stable service identity from a volatile resource name.
//!
//! Workload controllers append generated suffixes to resource names (a
//! template hash, then a random pod token), so `scanner-7f3ab2c9-kxj2p`
//! and `scanner-5d9c1e04-q8wzt` are the same service across redeploys.

use std::sync::LazyLock;

use regex::Regex;

/// A hyphen, 5+ lowercase hex characters, then optionally one more
/// hyphen-prefixed lowercase alphanumeric segment.
static GENERATED_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-[0-9a-f]{5,}(-[0-9a-z]+)?").expect("valid generated-suffix regex")
});

/// Strip every generated suffix from `name`.
///
/// Idempotent. A name made only of suffix material is returned unchanged
/// rather than collapsing to an empty service label.
pub fn service_identity(name: &str) -> String {
    let stripped = GENERATED_SUFFIX.replace_all(name, "");
    if stripped.is_empty() {
        name.to_string()
    } else {
        stripped.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_replicaset_and_pod_suffix() {
        assert_eq!(service_identity("scanner-7f3ab2c9-kxj2p"), "scanner");
    }

    #[test]
    fn strips_single_hex_suffix() {
        assert_eq!(service_identity("api-gateway-6d4cf56db6"), "api-gateway");
    }

    #[test]
    fn keeps_plain_names() {
        assert_eq!(service_identity("plain-name"), "plain-name");
        assert_eq!(service_identity("redis"), "redis");
    }

    #[test]
    fn short_hex_segments_are_not_suffixes() {
        assert_eq!(service_identity("app-beef"), "app-beef");
        assert_eq!(service_identity("web-v2"), "web-v2");
    }

    #[test]
    fn uppercase_hex_is_not_generated() {
        assert_eq!(service_identity("svc-ABCDEF"), "svc-ABCDEF");
    }

    #[test]
    fn strips_prefixed_report_names() {
        assert_eq!(
            service_identity("replicaset-nginx-7f3ab2c9-kxj2p"),
            "replicaset-nginx"
        );
    }

    #[test]
    fn all_suffix_name_is_kept() {
        assert_eq!(service_identity("-abcdef"), "-abcdef");
    }

    #[test]
    fn twice_equals_once_for_examples() {
        for name in ["scanner-7f3ab2c9-kxj2p", "app-12345-67890-xyz", "plain-name", ""] {
            let once = service_identity(name);
            assert_eq!(service_identity(&once), once, "input {:?}", name);
        }
    }

    proptest! {
        #[test]
        fn idempotent(name in "[a-z0-9-]{0,40}") {
            let once = service_identity(&name);
            prop_assert_eq!(service_identity(&once), once);
        }

        #[test]
        fn idempotent_on_generated_names(
            base in "[a-z]{1,12}",
            hash in "[0-9a-f]{5,10}",
            token in "[0-9a-z]{5}",
        ) {
            let name = format!("{}-{}-{}", base, hash, token);
            let once = service_identity(&name);
            prop_assert_eq!(&once, &base);
            prop_assert_eq!(service_identity(&once), once);
        }
    }
}
