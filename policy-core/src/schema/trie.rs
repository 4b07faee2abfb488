//! Radix trie over [`PathNode`]s, tracking the dominant variant at each depth
//! (spec §9 "Schema-conflict data structure").

use std::collections::{HashMap, HashSet};

use policy_types::{Identity, PathNode};

/// The branch-selecting part of a [`PathNode`]: attribute name for object
/// fields, key attribute for keyed-list elements. Two elements of the same
/// keyed list (same key attribute, different key value) share a branch --
/// `key_value` never participates in trie structure, only in the exact-path
/// equality used for terminal-type comparison in [`super::ConflictDetector`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ShapeKey {
    Field(String),
    KeyedList(String),
}

impl From<&PathNode> for ShapeKey {
    fn from(node: &PathNode) -> Self {
        match node {
            PathNode::Field { attribute } => ShapeKey::Field(attribute.clone()),
            PathNode::KeyedListElement { key_attribute, .. } => ShapeKey::KeyedList(key_attribute.clone()),
        }
    }
}

/// Two branches at the same depth imply incompatible schemas for that
/// ancestor location unless both are object-field branches (spec §4.2):
/// sibling fields never conflict, but any keyed-list branch conflicts with
/// every other branch at its depth, including another keyed-list with a
/// different key attribute.
fn branches_conflict(a: &ShapeKey, b: &ShapeKey) -> bool {
    matches!(a, ShapeKey::KeyedList(_)) || matches!(b, ShapeKey::KeyedList(_))
}

#[derive(Default)]
struct Node {
    children: HashMap<ShapeKey, Node>,
    /// Every identity whose path passes through this node, not just leaves --
    /// lets [`Trie::conflicts_with`] collect a whole conflicting subtree in
    /// one lookup.
    subtree_ids: HashSet<Identity>,
}

#[derive(Default)]
pub struct Trie {
    root: Node,
}

impl Trie {
    pub fn insert(&mut self, identity: Identity, path: Vec<PathNode>) {
        let mut node = &mut self.root;
        node.subtree_ids.insert(identity.clone());
        for path_node in &path {
            node = node.children.entry(ShapeKey::from(path_node)).or_default();
            node.subtree_ids.insert(identity.clone());
        }
    }

    pub fn remove(&mut self, identity: &Identity, path: &[PathNode]) {
        remove_rec(&mut self.root, identity, path);
    }

    /// Every identity (other than `identity` itself) reachable through a
    /// branch that conflicts with `path` at any shared depth.
    pub fn conflicts_with(&self, identity: &Identity, path: &[PathNode]) -> HashSet<Identity> {
        let mut acc = HashSet::new();
        let mut node = &self.root;
        for path_node in path {
            let key = ShapeKey::from(path_node);
            for (other_key, other_child) in &node.children {
                if *other_key != key && branches_conflict(other_key, &key) {
                    acc.extend(other_child.subtree_ids.iter().cloned());
                }
            }
            match node.children.get(&key) {
                Some(child) => node = child,
                None => break,
            }
        }
        acc.remove(identity);
        acc
    }
}

fn remove_rec(node: &mut Node, identity: &Identity, path: &[PathNode]) -> bool {
    node.subtree_ids.remove(identity);
    if let Some((head, rest)) = path.split_first() {
        let key = ShapeKey::from(head);
        if let Some(child) = node.children.get_mut(&key) {
            if remove_rec(child, identity, rest) {
                node.children.remove(&key);
            }
        }
    }
    node.subtree_ids.is_empty() && node.children.is_empty()
}
