//! The mutation system (spec §2 component 3, §4.2): `Upsert`/`Remove`/
//! `GetConflicts` over mutator identity, backed by the schema-conflict trie.

use std::collections::HashSet;

use policy_types::{Identity, MutatorSpec};
use thiserror::Error;

use crate::schema::{ConflictDetector, MutatorShape};

/// Mutator instantiation is opaque to this core (spec §1): the only concrete
/// failure mode we can name ourselves is a mutator with no path at all, which
/// can never address a location and so can never be enforced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstantiationError {
    #[error("mutator path must not be empty")]
    EmptyPath,
}

fn instantiate(spec: &MutatorSpec) -> Result<MutatorShape, InstantiationError> {
    if spec.path.is_empty() {
        return Err(InstantiationError::EmptyPath);
    }
    Ok(MutatorShape {
        path: spec.path.clone(),
        terminal_type: spec.terminal_type,
    })
}

/// Façade over [`ConflictDetector`] that speaks in terms of the user-declared
/// [`MutatorSpec`] rather than the bare [`MutatorShape`].
#[derive(Default)]
pub struct MutationSystem {
    conflicts: ConflictDetector,
}

impl MutationSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any prior mutator with this identity. Per spec §4.2, this
    /// always succeeds for a well-formed spec -- schema conflicts are not
    /// upsert failures, only [`InstantiationError`] is.
    pub fn upsert(&self, identity: Identity, spec: &MutatorSpec) -> Result<(), InstantiationError> {
        let shape = instantiate(spec)?;
        self.conflicts.upsert(identity, shape);
        Ok(())
    }

    pub fn remove(&self, identity: &Identity) {
        self.conflicts.remove(identity);
    }

    pub fn get_conflicts(&self, identity: &Identity) -> HashSet<Identity> {
        self.conflicts.get_conflicts(identity)
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.conflicts.contains(identity)
    }
}
