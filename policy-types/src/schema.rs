//! The implied-schema representation of a mutator's target location.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One step in a [`crate::mutator::MutatorSpec`] path.
///
/// Two nodes are compatible at a given depth iff they are the same variant,
/// and (for [`PathNode::Field`]) have the same attribute name, or (for
/// [`PathNode::KeyedListElement`]) the same key attribute. See spec §4.2.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PathNode {
    /// An object-field node, e.g. `.spec.bar`.
    Field { attribute: String },
    /// A keyed-list-element node, e.g. `.spec[name: foo]`.
    KeyedListElement { key_attribute: String, key_value: String },
}

impl PathNode {
    /// True iff `self` and `other` describe the same schema shape at this
    /// depth (ignoring `key_value`, which only disambiguates *which* element,
    /// not the implied schema).
    pub fn same_shape(&self, other: &PathNode) -> bool {
        match (self, other) {
            (PathNode::Field { attribute: a }, PathNode::Field { attribute: b }) => a == b,
            (
                PathNode::KeyedListElement { key_attribute: a, .. },
                PathNode::KeyedListElement { key_attribute: b, .. },
            ) => a == b,
            _ => false,
        }
    }

    /// True iff the two nodes are the same *variant* (Field vs KeyedListElement),
    /// regardless of attribute/key names -- the conflict trigger in spec §4.2.
    pub fn same_variant(&self, other: &PathNode) -> bool {
        matches!(
            (self, other),
            (PathNode::Field { .. }, PathNode::Field { .. })
                | (PathNode::KeyedListElement { .. }, PathNode::KeyedListElement { .. })
        )
    }
}

/// The kind of value at a [`crate::mutator::MutatorSpec`] path's end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum TerminalType {
    Set,
    String,
    Number,
    Boolean,
    List,
    Object,
    Unknown,
}
