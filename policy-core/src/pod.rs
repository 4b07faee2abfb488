//! Resolution of the executing reconciler's own [`PodIdentity`] (spec §3, §9).
//!
//! Kept injectable rather than defaulted to a real lookup: a core that
//! silently discovers its own identity would need a watch just to find
//! itself, which spec §6 explicitly forbids ("must be injected; a default
//! panics").

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client, ResourceExt};
use policy_types::PodIdentity;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("required downward-API environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("failed to look up own pod: {0}")]
    Kube(#[from] kube::Error),
    #[error("own pod has no UID")]
    MissingUid,
}

/// Injectable pod-identity resolver, called once per reconcile that needs it.
/// Real implementations close over whatever client they need; this keeps the
/// signature free of a concrete transport type.
pub type GetPod = Arc<dyn Fn() -> BoxFuture<'static, Result<PodIdentity, Error>> + Send + Sync>;

/// The unsafe default: refuses to guess, and aborts rather than risk a
/// reconciler that silently watches itself. Production wiring must call
/// [`from_downward_api`] (or an equivalent) explicitly.
pub fn poisoned_default() -> GetPod {
    Arc::new(|| {
        async {
            panic!(
                "policy_core::pod::GetPod was never injected with a real implementation; \
                 refusing to default to an unsafe self-lookup"
            )
        }
        .boxed()
    })
}

/// Resolves the reconciler's own pod identity from the Kubernetes downward
/// API (`POD_NAME`/`POD_NAMESPACE` env vars, conventionally populated via
/// `fieldRef` in the pod spec) plus one `Get` against the resource server for
/// the UID.
pub fn from_downward_api(client: Client) -> GetPod {
    Arc::new(move || resolve(client.clone()).boxed())
}

async fn resolve(client: Client) -> Result<PodIdentity, Error> {
    let pod_name = std::env::var("POD_NAME").map_err(|_| Error::MissingEnv("POD_NAME"))?;
    let namespace = std::env::var("POD_NAMESPACE").map_err(|_| Error::MissingEnv("POD_NAMESPACE"))?;
    let api: Api<Pod> = Api::namespaced(client, &namespace);
    let pod = api.get(&pod_name).await?;
    let uid = pod.uid().ok_or(Error::MissingUid)?;
    Ok(PodIdentity {
        pod_name,
        namespace,
        uid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[should_panic(expected = "never injected")]
    async fn default_is_poisoned() {
        let get_pod = poisoned_default();
        let _ = get_pod().await;
    }
}
