//! Mutator Reconciler (spec §2 component 6, §4.3): the skeleton specialized
//! with conflict-set diffing and peer re-enqueue.

use std::sync::Arc;

use kube::runtime::controller::Action;
use kube::runtime::reflector::ObjectRef;
use kube::{Api, ResourceExt};
use policy_types::pod_status::{StatusError, ERR_CONFLICTING_SCHEMA_TYPE};
use policy_types::{Identity, Mutator, MutatorPodStatus};
use thiserror::Error;

use super::{generation_of, get_or_default, Observed, TRANSIENT_RETRY};
use crate::channel::PeerSender;
use crate::pod::GetPod;
use crate::systems::MutationSystem;

#[derive(Debug, Error)]
pub enum Error {
    #[error("pod identity lookup failed: {0}")]
    Pod(#[from] crate::pod::Error),
    #[error(transparent)]
    Kube(#[from] kube::Error),
    #[error("failed to write mutator status: {0}")]
    Status(#[from] crate::status::Error),
    #[error("failed to derive status key: {0}")]
    Key(#[from] crate::error::Error),
}

pub struct Context {
    pub mutators: Api<Mutator>,
    pub statuses: Api<MutatorPodStatus>,
    pub system: Arc<MutationSystem>,
    pub peers: PeerSender,
    pub get_pod: GetPod,
}

fn identity_from_request(request: &ObjectRef<Mutator>) -> Identity {
    Identity::new(
        "Mutator",
        request.namespace.clone().unwrap_or_default(),
        request.name.clone(),
    )
}

/// Conflict-error message naming every identity currently in conflict with
/// `identity` (itself included), sorted for determinism -- spec §8 S2 expects
/// a message that is a superset of `"bar, bar-2"` for that scenario's pair.
fn conflict_message(identity: &Identity, conflicts: &std::collections::HashSet<Identity>) -> String {
    let mut names: Vec<&str> = std::iter::once(identity.name.as_str())
        .chain(conflicts.iter().map(|c| c.name.as_str()))
        .collect();
    names.sort_unstable();
    names.dedup();
    format!("conflicting schema among {}", names.join(", "))
}

#[tracing::instrument(skip(ctx), fields(name = %request.name, namespace = request.namespace.as_deref().unwrap_or("")))]
pub async fn reconcile(request: ObjectRef<Mutator>, ctx: Arc<Context>) -> Result<Action, Error> {
    let identity = identity_from_request(&request);
    let prev_conflicts = ctx.system.get_conflicts(&identity);

    let observed = get_or_default(&ctx.mutators, &request).await?;

    if observed.is_deleted() {
        ctx.system.remove(&identity);
        for peer in prev_conflicts.difference(&ctx.system.get_conflicts(&identity)) {
            ctx.peers.try_notify(peer.clone());
        }
        let pod = (ctx.get_pod)().await?;
        let key = crate::identity::key_for_mutator(&pod.pod_name, &identity)?;
        crate::status::delete_status(&ctx.statuses, &key).await?;
        return Ok(Action::await_change());
    }

    let obj = match observed {
        Observed::Live(obj) => obj,
        Observed::Deleted { .. } => unreachable!("handled above"),
    };
    let generation = generation_of(obj.as_ref());
    let uid = obj.uid().unwrap_or_default();

    match ctx.system.upsert(identity.clone(), &obj.spec) {
        Ok(()) => {}
        Err(instantiation_err) => {
            // Instantiation errors are a property of the object, not a
            // transient failure -- record and stop, no requeue (spec §4.3 step 5).
            let pod = (ctx.get_pod)().await?;
            crate::status::upsert_mutator_status(
                &ctx.statuses,
                &pod,
                &identity,
                &uid,
                generation,
                false,
                vec![StatusError::untyped(instantiation_err.to_string())],
            )
            .await?;
            return Ok(Action::await_change());
        }
    }

    let new_conflicts = ctx.system.get_conflicts(&identity);
    for peer in prev_conflicts.symmetric_difference(&new_conflicts) {
        if peer != &identity {
            ctx.peers.try_notify(peer.clone());
        }
    }

    let enforced = new_conflicts.is_empty();
    let errors = if enforced {
        Vec::new()
    } else {
        vec![StatusError::typed(
            ERR_CONFLICTING_SCHEMA_TYPE,
            conflict_message(&identity, &new_conflicts),
        )]
    };

    let pod = (ctx.get_pod)().await?;
    crate::status::upsert_mutator_status(&ctx.statuses, &pod, &identity, &uid, generation, enforced, errors).await?;
    Ok(Action::await_change())
}

/// Transient failures get a bounded retry; instantiation/conflict outcomes
/// never reach here since they return `Ok` above (spec §4.3 "Failure semantics").
pub fn error_policy(_request: &ObjectRef<Mutator>, _err: &Error, _ctx: Arc<Context>) -> Action {
    Action::requeue(TRANSIENT_RETRY)
}
