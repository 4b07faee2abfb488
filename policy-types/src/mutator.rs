//! The `Mutator` custom resource: a declarative rule modifying matching
//! resources in place (spec §3).

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schema::{PathNode, TerminalType};

pub use crate::pod_status::MutatorPodStatus;

/// A user-declared mutation rule.
///
/// `match_criteria` is opaque to this core (rule compilation/evaluation is out
/// of scope, see spec §1); it is carried through untouched for the mutation
/// engine that actually applies the rule to resources.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "policy.example.io",
    version = "v1",
    kind = "Mutator",
    namespaced,
    status = "MutatorStatus",
    shortname = "mut"
)]
#[serde(rename_all = "camelCase")]
pub struct MutatorSpec {
    /// Ordered sequence of path nodes addressing the location this mutator writes to.
    pub path: Vec<PathNode>,
    /// The kind of value produced at the end of `path`.
    pub terminal_type: TerminalType,
    /// Opaque match criteria, interpreted by the policy evaluation engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_criteria: Option<serde_json::Value>,
}

/// Aggregated, cluster-wide view of a [`Mutator`]'s per-pod ingestion state,
/// rolled up by the status aggregator (spec §4.6) from the individual
/// [`MutatorPodStatus`] objects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MutatorStatus {
    #[serde(default)]
    pub by_pod: Vec<MutatorPodStatusRef>,
}

/// One entry of [`MutatorStatus::by_pod`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MutatorPodStatusRef {
    pub pod_id: String,
    pub observed_generation: i64,
    pub enforced: bool,
    #[serde(default)]
    pub errors: Vec<crate::pod_status::StatusError>,
}
