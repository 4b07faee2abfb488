//! Per-pod status objects (spec §3 "PerPodStatus", §6 "External Interfaces").
//!
//! Unlike `Mutator`/`Connection`, these objects carry no independent user
//! spec: the whole object *is* the authoritative status report, analogous to
//! a Kubernetes `Event` -- so there is no `status` subresource split here,
//! just one flat, reconciler-owned spec.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group shared by every type in this crate.
pub const GROUP: &str = "policy.example.io";

/// Label carrying the source object's name, required for aggregator discovery (spec §6).
pub fn label_object_name() -> String {
    format!("{GROUP}/object-name")
}

/// Label carrying the source kind; only set on [`MutatorPodStatus`] (spec §6).
pub fn label_object_kind() -> String {
    format!("{GROUP}/object-kind")
}

/// Label carrying the reconciler pod's name (spec §6).
pub fn label_pod() -> String {
    format!("{GROUP}/pod")
}

/// The distinguished conflict-error type tag (spec §4.2, §7).
pub const ERR_CONFLICTING_SCHEMA_TYPE: &str = "ErrConflictingSchema";
/// Connection error taxonomy (spec §6): a driver upsert failed.
pub const ERR_UPSERT_CONNECTION: &str = "UpsertConnectionError";
/// Connection error taxonomy (spec §6): a publish attempt failed.
pub const ERR_PUBLISH: &str = "PublishError";
/// Connection error taxonomy (spec §6): a driver close failed.
pub const ERR_CLOSE_CONNECTION: &str = "CloseConnectionError";

/// One entry of a status object's `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusError {
    /// Present for connection errors (always) and mutator conflict errors;
    /// absent for untyped mutator instantiation errors (spec §6).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    pub message: String,
}

impl StatusError {
    pub fn typed(r#type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            r#type: Some(r#type.into()),
            message: message.into(),
        }
    }

    pub fn untyped(message: impl Into<String>) -> Self {
        Self {
            r#type: None,
            message: message.into(),
        }
    }
}

/// This replica's local view of one [`crate::mutator::Mutator`]'s ingestion state.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "policy.example.io",
    version = "v1",
    kind = "MutatorPodStatus",
    namespaced,
    shortname = "mps"
)]
#[serde(rename_all = "camelCase")]
pub struct MutatorPodStatusSpec {
    /// Reconciler pod name, echoed in the status payload.
    pub pod_id: String,
    /// Source `Mutator`'s UID, for stale-status detection by the aggregator.
    pub object_uid: String,
    /// Source `Mutator` generation at last successful reconcile.
    pub observed_generation: i64,
    /// True iff present in the mutation system, conflict-free, and error-free.
    pub enforced: bool,
    #[serde(default)]
    pub errors: Vec<StatusError>,
}

/// This replica's local view of one [`crate::connection::Connection`]'s ingestion state.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "policy.example.io",
    version = "v1",
    kind = "ConnectionPodStatus",
    namespaced,
    shortname = "cps"
)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPodStatusSpec {
    pub pod_id: String,
    /// Source `Connection`'s UID.
    pub connection_uid: String,
    pub observed_generation: i64,
    /// True only immediately after a successful `Publish`; reset on generation bump.
    pub active: bool,
    #[serde(default)]
    pub errors: Vec<StatusError>,
}
