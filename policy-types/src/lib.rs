//! Typed Kubernetes objects for the policy-engine admission/audit controller.
//!
//! Mirrors the role `kube-core` plays for the `kube` client: this crate only
//! carries data shapes (CRDs, path/identity primitives) that the reconciliation
//! core in `policy-core` operates on. No reconcile logic lives here.

pub mod connection;
pub mod identity;
pub mod mutator;
pub mod pod_status;
pub mod schema;

pub use connection::{Connection, ConnectionPodStatus, ConnectionSpec};
pub use identity::{Identity, PodIdentity};
pub use mutator::{Mutator, MutatorPodStatus, MutatorSpec};
pub use schema::{PathNode, TerminalType};
