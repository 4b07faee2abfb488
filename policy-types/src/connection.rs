//! The `Connection` custom resource: a user-declared external destination for
//! exported events (spec §3).

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use crate::pod_status::ConnectionPodStatus;

/// A user-declared export connection.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "policy.example.io",
    version = "v1",
    kind = "Connection",
    namespaced,
    status = "ConnectionStatus",
    shortname = "conn"
)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSpec {
    /// Identifies which export driver handles this connection (e.g. `log`, `slack`).
    pub driver: String,
    /// Opaque payload passed to the driver; core never interprets its contents.
    #[serde(default)]
    pub config: serde_json::Value,
}

/// Aggregated, cluster-wide view of a [`Connection`]'s per-pod state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    #[serde(default)]
    pub by_pod: Vec<ConnectionPodStatusRef>,
}

/// One entry of [`ConnectionStatus::by_pod`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPodStatusRef {
    pub pod_id: String,
    pub observed_generation: i64,
    pub active: bool,
    #[serde(default)]
    pub errors: Vec<crate::pod_status::StatusError>,
}
