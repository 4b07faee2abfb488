//! The generic reconciler skeleton (spec §2 component 5, §4.1 item 5): shared
//! observe-or-default / mutate-system / write-status shape specialized by
//! [`mutator`] and [`connection`].
//!
//! Grounded on `kube-runtime/src/controller/mod.rs`'s `Action`/`ReconcileRequest`
//! types and the `Arc<K>`/`Arc<Context>` reconcile-callback shape used across
//! the corpus's own controller entrypoints (e.g. the echo-operator's
//! `reconcile(echo: Arc<Echo>, ctx: Arc<Context>)`), but the reconcile *body*
//! below is this system's own per-request algorithm, not a rebuild of
//! `Controller` itself -- the watch/work-queue plumbing stays external (spec §1).

pub mod connection;
pub mod mutator;

use std::sync::Arc;
use std::time::Duration;

use kube::runtime::reflector::ObjectRef;
use kube::Resource;

/// Transient resource-server failures get a short, bounded backoff; the work
/// queue (external, §9) is expected to apply its own rate limiting on top.
pub(crate) const TRANSIENT_RETRY: Duration = Duration::from_secs(5);

/// Result of `GetOrDefault` (spec §4.3 step 1 / §4.4 step 1): either the live
/// object, or a synthetic tombstone recording just enough to drive deletion
/// handling when the resource server already reports NotFound.
pub(crate) enum Observed<K> {
    Live(Arc<K>),
    Deleted { namespace: String, name: String },
}

impl<K> Observed<K> {
    pub(crate) fn is_deleted(&self) -> bool {
        matches!(self, Observed::Deleted { .. })
    }
}

/// Fetches `request` fresh from the resource server, mapping NotFound to a
/// tombstone rather than an error (spec §4.3 step 1).
pub(crate) async fn get_or_default<K>(
    api: &kube::Api<K>,
    request: &ObjectRef<K>,
) -> Result<Observed<K>, kube::Error>
where
    K: Resource + Clone + serde::de::DeserializeOwned + std::fmt::Debug,
{
    match api.get(&request.name).await {
        Ok(obj) => Ok(Observed::Live(Arc::new(obj))),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(Observed::Deleted {
            namespace: request.namespace.clone().unwrap_or_default(),
            name: request.name.clone(),
        }),
        Err(e) => Err(e),
    }
}

pub(crate) fn generation_of<K: Resource>(obj: &K) -> i64 {
    obj.meta().generation.unwrap_or(1)
}
