//! Stable identifiers for owned objects and the pod executing the reconciler.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The triple that uniquely names a policy object within the cluster scope.
///
/// See spec §3 "Pod Identity" / "Identity".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl Identity {
    pub fn new(kind: impl Into<String>, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// The (pod-name, namespace, UID) triple identifying the executing reconciler
/// replica, obtained once at process start and held immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodIdentity {
    pub pod_name: String,
    pub namespace: String,
    pub uid: String,
}
