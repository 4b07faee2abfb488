//! Per-Pod Status Writer (spec §4.5): convergence logic that creates-or-updates
//! the authoritative per-pod status for an owned object, grounded on
//! `configmapgen_controller.rs`'s patch-based upsert against the resource
//! server, specialized here to an explicit create-vs-replace (the status
//! object's full contents are reconciler-owned, so server-side apply would
//! buy us nothing over a plain read-modify-write).

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::api::{Api, PostParams};
use kube::ResourceExt;
use policy_types::pod_status::{label_object_kind, label_object_name, label_pod, StatusError};
use policy_types::{ConnectionPodStatus, Identity, MutatorPodStatus, PodIdentity};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("status key derivation failed: {0}")]
    Key(#[from] crate::error::Error),
    #[error(transparent)]
    Kube(#[from] kube::Error),
}

/// How the caller wants the `Active`/`Enforced` flag handled for this write.
/// Mutator status always computes `Enforced` fresh (spec §4.5 step 5), but the
/// connection reconciler's Active-flag convergence rule (spec §4.4) needs to
/// distinguish "no opinion, apply the convergence rule" from "the publish path
/// just succeeded/failed, write this value".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveHint {
    Unspecified,
    Explicit(bool),
}

fn owner_reference(pod: &PodIdentity) -> OwnerReference {
    OwnerReference {
        api_version: "v1".to_string(),
        kind: "Pod".to_string(),
        name: pod.pod_name.clone(),
        uid: pod.uid.clone(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

fn labels(object_name: &str, object_kind: Option<&str>, pod_name: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(label_object_name(), object_name.to_string());
    if let Some(kind) = object_kind {
        labels.insert(label_object_kind(), kind.to_string());
    }
    labels.insert(label_pod(), pod_name.to_string());
    labels
}

/// Writes the per-pod status for a [`policy_types::Mutator`] (spec §4.5, specialized
/// per §4.3 step 8: `enforced = present AND conflicts.is_empty() AND errors.is_empty()`,
/// computed by the caller and passed in already-resolved).
pub async fn upsert_mutator_status(
    api: &Api<MutatorPodStatus>,
    pod: &PodIdentity,
    mutator_identity: &Identity,
    mutator_uid: &str,
    generation: i64,
    enforced: bool,
    errors: Vec<StatusError>,
) -> Result<(), Error> {
    let key = crate::identity::key_for_mutator(&pod.pod_name, mutator_identity)?;
    let existing = api.get_opt(&key).await?;

    let mut status = match existing {
        Some(mut prev) => {
            prev.spec.pod_id = pod.pod_name.clone();
            prev.spec.object_uid = mutator_uid.to_string();
            prev.spec.observed_generation = generation;
            prev.spec.enforced = enforced;
            prev.spec.errors = errors;
            prev
        }
        None => MutatorPodStatus::new(
            &key,
            policy_types::mutator::MutatorPodStatusSpec {
                pod_id: pod.pod_name.clone(),
                object_uid: mutator_uid.to_string(),
                observed_generation: generation,
                enforced,
                errors,
            },
        ),
    };
    status.meta_mut().namespace = Some(pod.namespace.clone());
    status.meta_mut().owner_references = Some(vec![owner_reference(pod)]);
    status.meta_mut().labels = Some(labels(
        &mutator_identity.name,
        Some(&mutator_identity.kind),
        &pod.pod_name,
    ));

    write_back(api, &key, status).await
}

/// The Active-flag convergence rule itself (spec §4.4), factored out as a
/// pure function of the prior status (if any) and the hint so it can be unit
/// tested without a resource-server round trip.
///
/// - An explicit hint always wins (the publish path asserting success/failure).
/// - Otherwise, a generation bump resets `Active` to false; an unchanged
///   generation preserves whatever was there (a recent publish success must
///   survive an unrelated, audit-driven reconcile).
pub fn resolve_active(active_hint: ActiveHint, prior: Option<(i64, bool)>, generation: i64) -> bool {
    match active_hint {
        ActiveHint::Explicit(v) => v,
        ActiveHint::Unspecified => match prior {
            Some((prev_generation, prev_active)) if prev_generation == generation => prev_active,
            _ => false,
        },
    }
}

/// Writes the per-pod status for a [`policy_types::Connection`], applying the
/// Active-flag convergence rule from spec §4.4.
#[allow(clippy::too_many_arguments)]
pub async fn upsert_connection_status(
    api: &Api<ConnectionPodStatus>,
    pod: &PodIdentity,
    connection_name: &str,
    connection_uid: &str,
    generation: i64,
    errors: Vec<StatusError>,
    active_hint: ActiveHint,
) -> Result<(), Error> {
    let key = crate::identity::key_for_connection(&pod.pod_name, &pod.namespace, connection_name)?;
    let existing = api.get_opt(&key).await?;

    let prior = existing
        .as_ref()
        .map(|prev| (prev.spec.observed_generation, prev.spec.active));
    let active = resolve_active(active_hint, prior, generation);

    let mut status = match existing {
        Some(mut prev) => {
            prev.spec.pod_id = pod.pod_name.clone();
            prev.spec.connection_uid = connection_uid.to_string();
            prev.spec.observed_generation = generation;
            prev.spec.active = active;
            prev.spec.errors = errors;
            prev
        }
        None => ConnectionPodStatus::new(
            &key,
            policy_types::connection::ConnectionPodStatusSpec {
                pod_id: pod.pod_name.clone(),
                connection_uid: connection_uid.to_string(),
                observed_generation: generation,
                active,
                errors,
            },
        ),
    };
    status.meta_mut().namespace = Some(pod.namespace.clone());
    status.meta_mut().owner_references = Some(vec![owner_reference(pod)]);
    status.meta_mut().labels = Some(labels(connection_name, None, &pod.pod_name));

    write_back(api, &key, status).await
}

async fn write_back<K>(api: &Api<K>, key: &str, obj: K) -> Result<(), Error>
where
    K: kube::Resource + Clone + serde::Serialize + serde::de::DeserializeOwned + std::fmt::Debug,
    K::DynamicType: Default,
{
    if obj.resource_version().is_some() {
        api.replace(key, &PostParams::default(), &obj).await?;
    } else {
        api.create(&PostParams::default(), &obj).await?;
    }
    Ok(())
}

/// Deletes the per-pod status for a mutator or connection. NotFound is
/// treated as success (spec §4.3 step 4, §4.4 step 2).
pub async fn delete_status<K>(api: &Api<K>, key: &str) -> Result<(), kube::Error>
where
    K: kube::Resource + Clone + serde::Serialize + serde::de::DeserializeOwned + std::fmt::Debug,
    K::DynamicType: Default,
{
    match api.delete(key, &kube::api::DeleteParams::default()).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_only_set_object_kind_for_mutator() {
        let m = labels("bar", Some("fake"), "no-pod");
        assert_eq!(m.get(&label_object_kind()).map(String::as_str), Some("fake"));
        let c = labels("audit-connection", None, "no-pod");
        assert!(!c.contains_key(&label_object_kind()));
    }

    #[test]
    fn resolve_active_resets_on_generation_bump() {
        // S5(b): generation advanced since the last reconcile -> reset to false
        // even though the prior publish had set it true.
        assert_eq!(resolve_active(ActiveHint::Unspecified, Some((1, true)), 2), false);
    }

    #[test]
    fn resolve_active_preserves_when_generation_unchanged() {
        assert_eq!(resolve_active(ActiveHint::Unspecified, Some((1, true)), 1), true);
    }

    #[test]
    fn resolve_active_defaults_false_with_no_prior_status() {
        assert_eq!(resolve_active(ActiveHint::Unspecified, None, 1), false);
    }

    #[test]
    fn resolve_active_explicit_hint_overrides_generation_bump() {
        // The publish path asserting success must win even across a generation change.
        assert_eq!(resolve_active(ActiveHint::Explicit(true), Some((1, false)), 2), true);
    }

    #[test]
    fn active_hint_explicit_overrides_convergence() {
        assert_eq!(
            match ActiveHint::Explicit(true) {
                ActiveHint::Explicit(v) => v,
                ActiveHint::Unspecified => false,
            },
            true
        );
    }
}
