//! Status Aggregator (spec §2 component 8, §4.6): rolls up every per-pod
//! status for an owned object into that object's `.status.byPod` array.
//!
//! Specified "for completeness" (spec §4.6) rather than as core engineering --
//! the core's hard job is producing correct per-pod statuses (§4.3-§4.5); this
//! module only has to watch them and fan them back in. Shaped as a reconcile
//! callback over the per-pod status kind itself, the same
//! `Arc<K>`/`Arc<Context>` shape as [`crate::reconcile::mutator`] and
//! [`crate::reconcile::connection`], grounded on the same
//! `kube-runtime::Controller` reconcile-callback convention.

use std::sync::Arc;

use kube::api::{ListParams, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::runtime::reflector::ObjectRef;
use kube::{Api, ResourceExt};
use policy_types::pod_status::label_object_name;
use policy_types::connection::{ConnectionPodStatusRef, ConnectionStatus};
use policy_types::mutator::{MutatorPodStatusRef, MutatorStatus};
use policy_types::{ConnectionPodStatus, Mutator, MutatorPodStatus};
use thiserror::Error;

use super::reconcile::TRANSIENT_RETRY;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Kube(#[from] kube::Error),
}

/// Lists every [`MutatorPodStatus`] in `namespace` labeled as belonging to
/// `object_name` whose `object_uid` matches `uid`, sorted by pod identity
/// (spec §4.6: "sorts by pod identity"). Statuses written against a prior
/// incarnation of a recreated source object (stale UID) are skipped, per the
/// invariant in spec §4.5.
async fn list_matching_mutator_statuses(
    api: &Api<MutatorPodStatus>,
    object_name: &str,
    uid: &str,
) -> Result<Vec<MutatorPodStatusRef>, Error> {
    let lp = ListParams::default().labels(&format!("{}={object_name}", label_object_name()));
    let list = api.list(&lp).await?;
    let mut refs: Vec<MutatorPodStatusRef> = list
        .items
        .into_iter()
        .filter(|s| s.spec.object_uid == uid)
        .map(|s| MutatorPodStatusRef {
            pod_id: s.spec.pod_id,
            observed_generation: s.spec.observed_generation,
            enforced: s.spec.enforced,
            errors: s.spec.errors,
        })
        .collect();
    refs.sort_by(|a, b| a.pod_id.cmp(&b.pod_id));
    Ok(refs)
}

/// Rolls up all per-pod statuses for one [`Mutator`] into its
/// `.status.byPod` array (spec §4.6).
#[tracing::instrument(skip(mutators, statuses))]
pub async fn aggregate_mutator(
    mutators: &Api<Mutator>,
    statuses: &Api<MutatorPodStatus>,
    mutator: &Mutator,
) -> Result<Action, Error> {
    let name = mutator.name_any();
    let uid = mutator.uid().unwrap_or_default();
    let by_pod = list_matching_mutator_statuses(statuses, &name, &uid).await?;

    let patch = serde_json::json!({ "status": MutatorStatus { by_pod } });
    mutators
        .patch_status(&name, &PatchParams::apply("policy-core.aggregator"), &Patch::Merge(patch))
        .await?;
    Ok(Action::await_change())
}

async fn list_matching_connection_statuses(
    api: &Api<ConnectionPodStatus>,
    object_name: &str,
    uid: &str,
) -> Result<Vec<ConnectionPodStatusRef>, Error> {
    let lp = ListParams::default().labels(&format!("{}={object_name}", label_object_name()));
    let list = api.list(&lp).await?;
    let mut refs: Vec<ConnectionPodStatusRef> = list
        .items
        .into_iter()
        .filter(|s| s.spec.connection_uid == uid)
        .map(|s| ConnectionPodStatusRef {
            pod_id: s.spec.pod_id,
            observed_generation: s.spec.observed_generation,
            active: s.spec.active,
            errors: s.spec.errors,
        })
        .collect();
    refs.sort_by(|a, b| a.pod_id.cmp(&b.pod_id));
    Ok(refs)
}

/// Rolls up all per-pod statuses for one [`policy_types::Connection`] into
/// its `.status.byPod` array (spec §4.6).
#[tracing::instrument(skip(connections, statuses))]
pub async fn aggregate_connection(
    connections: &Api<policy_types::Connection>,
    statuses: &Api<ConnectionPodStatus>,
    connection: &policy_types::Connection,
) -> Result<Action, Error> {
    let name = connection.name_any();
    let uid = connection.uid().unwrap_or_default();
    let by_pod = list_matching_connection_statuses(statuses, &name, &uid).await?;

    let patch = serde_json::json!({ "status": ConnectionStatus { by_pod } });
    connections
        .patch_status(&name, &PatchParams::apply("policy-core.aggregator"), &Patch::Merge(patch))
        .await?;
    Ok(Action::await_change())
}

/// Shared `error_policy` for both aggregator reconcile functions (spec §4.6
/// inherits the same transient-retry discipline as §4.3/§4.4).
pub fn error_policy<K>(_object: &ObjectRef<K>, _err: &Error, _ctx: Arc<()>) -> Action
where
    K: kube::Resource,
{
    Action::requeue(TRANSIENT_RETRY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy_types::pod_status::StatusError;

    fn status_ref(pod_id: &str, enforced: bool) -> MutatorPodStatusRef {
        MutatorPodStatusRef {
            pod_id: pod_id.to_string(),
            observed_generation: 1,
            enforced,
            errors: Vec::new(),
        }
    }

    #[test]
    fn by_pod_sorts_by_pod_identity() {
        let mut refs = vec![status_ref("pod-b", true), status_ref("pod-a", false)];
        refs.sort_by(|a, b| a.pod_id.cmp(&b.pod_id));
        assert_eq!(refs[0].pod_id, "pod-a");
        assert_eq!(refs[1].pod_id, "pod-b");
    }

    #[test]
    fn status_error_roundtrips_through_ref() {
        let err = StatusError::typed("ErrConflictingSchema", "conflicting schema among bar, bar-2");
        let r = MutatorPodStatusRef {
            pod_id: "no-pod".into(),
            observed_generation: 2,
            enforced: false,
            errors: vec![err.clone()],
        };
        assert_eq!(r.errors[0], err);
    }
}
