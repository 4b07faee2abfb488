//! Pure, collision-free key derivation for per-pod status object names
//! (spec §4.1, §6).
//!
//! Each input component is escaped by doubling any separator character, then
//! components are joined by a single separator and suffixed with the target
//! kind. This is injective: `"no-pod" + "fake-bar"` and `"no" + "pod-fake-bar"`
//! escape to `no--pod-fake--bar-...` and `no-pod--fake--bar-...` respectively,
//! which never collide because an escaped component can never contain an
//! unescaped single separator.

use crate::error::Error;
use policy_types::Identity;

const SEP: char = '-';
const MAX_NAME_LEN: usize = 253;
const HASH_PREFIX_LEN: usize = 200;

fn escape_component(component: &str) -> String {
    component.replace(SEP, "--")
}

/// FNV-1a, used only to give overlong derivations a stable, deterministic
/// suffix -- not for anything security-sensitive.
fn fnv1a64(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in data {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn hash12(s: &str) -> String {
    format!("{:016x}", fnv1a64(s.as_bytes()))[..12].to_string()
}

fn derive(components: &[(&'static str, &str)], kind_suffix: &str) -> Result<String, Error> {
    let mut escaped = Vec::with_capacity(components.len());
    for (label, value) in components {
        if value.is_empty() {
            return Err(Error::EmptyComponent(label));
        }
        escaped.push(escape_component(value));
    }
    let joined = escaped.join(&SEP.to_string());
    let full = format!("{joined}{SEP}{kind_suffix}");
    if full.len() <= MAX_NAME_LEN {
        Ok(full)
    } else {
        let prefix_len = HASH_PREFIX_LEN.min(full.len());
        // UTF-8 safety: component escaping only ever substitutes ASCII '-', so
        // byte offsets from `.len()` always land on a char boundary here.
        Ok(format!("{}{SEP}{}", &full[..prefix_len], hash12(&full)))
    }
}

/// Deterministic name for a [`policy_types::pod_status::MutatorPodStatus`]
/// owned by `pod_name`, reflecting `identity`.
pub fn key_for_mutator(pod_name: &str, identity: &Identity) -> Result<String, Error> {
    derive(
        &[("pod_name", pod_name), ("namespace", &identity.namespace), ("name", &identity.name)],
        "mutatorpodstatus",
    )
}

/// Deterministic name for a [`policy_types::pod_status::ConnectionPodStatus`]
/// owned by `pod_name`, reflecting (namespace, name) of the source `Connection`.
pub fn key_for_connection(pod_name: &str, namespace: &str, name: &str) -> Result<String, Error> {
    derive(
        &[("pod_name", pod_name), ("namespace", namespace), ("name", name)],
        "connectionpodstatus",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injective_over_dash_ambiguity() {
        let a = key_for_connection("no-pod", "system", "fake-bar").unwrap();
        let b = key_for_connection("no", "system", "pod-fake-bar").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_empty_component() {
        let err = key_for_connection("", "system", "bar").unwrap_err();
        assert_eq!(err, Error::EmptyComponent("pod_name"));
    }

    #[test]
    fn deterministic_across_calls() {
        let id = Identity::new("fake", "system", "bar");
        let a = key_for_mutator("no-pod", &id).unwrap();
        let b = key_for_mutator("no-pod", &id).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn overlong_derivation_gets_hash_suffixed() {
        let long_name = "x".repeat(400);
        let key = key_for_connection("pod", "system", &long_name).unwrap();
        // Fixed-length fallback: HASH_PREFIX_LEN chars + separator + 12-char hash.
        assert_eq!(key.len(), HASH_PREFIX_LEN + 1 + 12);
    }

    #[test]
    fn distinct_identities_never_collide() {
        let mut seen = std::collections::HashSet::new();
        for pod in ["a", "a-a", "aa"] {
            for ns in ["x", "x-x"] {
                for name in ["y", "y-y", "yy"] {
                    let k = key_for_connection(pod, ns, name).unwrap();
                    assert!(seen.insert(k), "collision for {pod}/{ns}/{name}");
                }
            }
        }
    }
}
