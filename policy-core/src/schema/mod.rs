//! The implied-schema graph and cross-mutator conflict detector (spec §4.2).
//!
//! Each mutator's [`PathNode`] sequence is stored once, indexed by
//! [`Identity`]. A radix trie over path nodes remembers, at each depth, the
//! *dominant variant* seen there (object-field vs. keyed-list); two mutators
//! conflict iff their paths first disagree on variant (or, at a shared leaf,
//! on terminal type). The whole trie is guarded by a single mutex (spec §5):
//! mutator counts are expected to stay small, so contention is not a concern.

mod trie;

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use policy_types::{Identity, PathNode, TerminalType};

use self::trie::Trie;

/// A stored mutator's schema-relevant shape: its path and terminal type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutatorShape {
    pub path: Vec<PathNode>,
    pub terminal_type: TerminalType,
}

/// Thread-safe schema-conflict detector (spec §4.2 "Operations").
#[derive(Default)]
pub struct ConflictDetector {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    shapes: HashMap<Identity, MutatorShape>,
    trie: Trie,
}

impl ConflictDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any prior mutator with the same identity and updates the
    /// trie. Always succeeds -- a mutator is ingested regardless of
    /// conflicts; query [`Self::get_conflicts`] afterwards to find them.
    pub fn upsert(&self, identity: Identity, shape: MutatorShape) {
        let mut inner = self.inner.lock();
        if let Some(prev) = inner.shapes.remove(&identity) {
            inner.trie.remove(&identity, &prev.path);
        }
        inner.trie.insert(identity.clone(), shape.path.clone());
        inner.shapes.insert(identity, shape);
    }

    /// Removes the mutator. Idempotent: removing an absent identity is not an error.
    pub fn remove(&self, identity: &Identity) {
        let mut inner = self.inner.lock();
        if let Some(prev) = inner.shapes.remove(identity) {
            inner.trie.remove(identity, &prev.path);
        }
    }

    /// Returns the set of *other* identities currently in conflict with `identity`.
    /// Never contains `identity` itself; empty if `identity` is absent.
    pub fn get_conflicts(&self, identity: &Identity) -> HashSet<Identity> {
        let inner = self.inner.lock();
        let Some(shape) = inner.shapes.get(identity) else {
            return HashSet::new();
        };
        let mut conflicts = inner.trie.conflicts_with(identity, &shape.path);
        // Terminal-type disagreement at a fully shared path is also a conflict (spec §4.2).
        for (other_id, other_shape) in &inner.shapes {
            if other_id == identity {
                continue;
            }
            if other_shape.path == shape.path && other_shape.terminal_type != shape.terminal_type {
                conflicts.insert(other_id.clone());
            }
        }
        conflicts.remove(identity);
        conflicts
    }

    /// True iff `identity` is currently present in the system.
    pub fn contains(&self, identity: &Identity) -> bool {
        self.inner.lock().shapes.contains_key(identity)
    }

    /// Number of mutators currently ingested (for observability/tests).
    pub fn len(&self) -> usize {
        self.inner.lock().shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> Identity {
        Identity::new("fake", "system", name)
    }

    fn field(attr: &str) -> PathNode {
        PathNode::Field {
            attribute: attr.to_string(),
        }
    }

    fn keyed(key_attr: &str, key_value: &str) -> PathNode {
        PathNode::KeyedListElement {
            key_attribute: key_attr.to_string(),
            key_value: key_value.to_string(),
        }
    }

    fn shape(path: Vec<PathNode>) -> MutatorShape {
        MutatorShape {
            path,
            terminal_type: TerminalType::String,
        }
    }

    #[test]
    fn no_conflict_between_sibling_fields() {
        let d = ConflictDetector::new();
        d.upsert(id("a"), shape(vec![field("spec"), field("foo")]));
        d.upsert(id("b"), shape(vec![field("spec"), field("bar")]));
        assert!(d.get_conflicts(&id("a")).is_empty());
        assert!(d.get_conflicts(&id("b")).is_empty());
    }

    #[test]
    fn conflict_between_field_and_keyed_list_at_same_depth() {
        // S1/S2 from spec §8: bar expects a keyed list at spec[name: foo].bar,
        // bar-2 uses an object field at spec.bar -- depth-1 variant clash.
        let d = ConflictDetector::new();
        d.upsert(id("bar"), shape(vec![keyed("name", "foo"), field("bar")]));
        d.upsert(id("bar-2"), shape(vec![field("bar")]));
        let conflicts_bar = d.get_conflicts(&id("bar"));
        let conflicts_bar2 = d.get_conflicts(&id("bar-2"));
        assert_eq!(conflicts_bar, HashSet::from([id("bar-2")]));
        assert_eq!(conflicts_bar2, HashSet::from([id("bar")]));
    }

    #[test]
    fn conflict_is_symmetric_and_excludes_self() {
        let d = ConflictDetector::new();
        d.upsert(id("a"), shape(vec![keyed("k", "v")]));
        d.upsert(id("b"), shape(vec![field("k")]));
        d.upsert(id("c"), shape(vec![field("k")]));
        for (who, others) in [("a", ["b", "c"]), ("b", ["a"]), ("c", ["a"])] {
            let got = d.get_conflicts(&id(who));
            assert!(!got.contains(&id(who)));
            for other in others {
                assert!(got.contains(&id(other)), "{who} missing conflict with {other}");
            }
        }
    }

    #[test]
    fn fixing_a_path_resolves_conflict() {
        // S3 from spec §8.
        let d = ConflictDetector::new();
        d.upsert(id("bar"), shape(vec![keyed("name", "foo"), field("bar")]));
        d.upsert(id("bar-2"), shape(vec![field("bar")]));
        assert!(!d.get_conflicts(&id("bar")).is_empty());

        d.upsert(id("bar-2"), shape(vec![keyed("name", "foo"), field("qux")]));
        assert!(d.get_conflicts(&id("bar")).is_empty());
        assert!(d.get_conflicts(&id("bar-2")).is_empty());
    }

    #[test]
    fn deleting_one_conflicting_peer_preserves_the_others_conflict() {
        // S4 from spec §8 (full paths, sharing the `spec` prefix): bar-2
        // conflicts with bar-3 at depth 2. Deleting bar-1 must not disturb that.
        let d = ConflictDetector::new();
        d.upsert(
            id("bar-1"),
            shape(vec![field("spec"), keyed("name", "foo"), field("bar")]),
        );
        d.upsert(
            id("bar-2"),
            shape(vec![field("spec"), field("bar"), field("qux")]),
        );
        d.upsert(
            id("bar-3"),
            shape(vec![field("spec"), field("bar"), keyed("name", "foo"), field("qux")]),
        );
        assert!(d.get_conflicts(&id("bar-2")).contains(&id("bar-3")));
        assert!(d.get_conflicts(&id("bar-3")).contains(&id("bar-2")));

        d.remove(&id("bar-1"));
        assert!(!d.contains(&id("bar-1")));
        assert!(d.get_conflicts(&id("bar-2")).contains(&id("bar-3")));
        assert!(d.get_conflicts(&id("bar-3")).contains(&id("bar-2")));
    }

    #[test]
    fn terminal_type_mismatch_on_shared_path_is_a_conflict() {
        let d = ConflictDetector::new();
        d.upsert(
            id("a"),
            MutatorShape {
                path: vec![field("spec"), field("foo")],
                terminal_type: TerminalType::String,
            },
        );
        d.upsert(
            id("b"),
            MutatorShape {
                path: vec![field("spec"), field("foo")],
                terminal_type: TerminalType::Number,
            },
        );
        assert_eq!(d.get_conflicts(&id("a")), HashSet::from([id("b")]));
    }

    #[test]
    fn upsert_remove_round_trip_restores_prior_state() {
        let d = ConflictDetector::new();
        d.upsert(id("a"), shape(vec![field("spec"), field("foo")]));
        let before = d.get_conflicts(&id("a"));
        d.upsert(id("m"), shape(vec![keyed("name", "x")]));
        d.remove(&id("m"));
        assert_eq!(d.get_conflicts(&id("a")), before);
        assert!(!d.contains(&id("m")));
    }

    #[test]
    fn remove_is_idempotent_for_absent_identity() {
        let d = ConflictDetector::new();
        d.remove(&id("ghost"));
        d.remove(&id("ghost"));
        assert!(d.get_conflicts(&id("ghost")).is_empty());
    }
}
