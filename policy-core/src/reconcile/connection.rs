//! Connection Reconciler (spec §2 component 7, §4.4): the skeleton
//! specialized with a single-name admission gate and Active-flag convergence.

use std::sync::Arc;

use kube::runtime::controller::Action;
use kube::runtime::reflector::ObjectRef;
use kube::{Api, ResourceExt};
use policy_types::pod_status::{StatusError, ERR_UPSERT_CONNECTION};
use policy_types::{Connection, ConnectionPodStatus};
use thiserror::Error;

use super::{generation_of, get_or_default, Observed, TRANSIENT_RETRY};
use crate::pod::GetPod;
use crate::status::ActiveHint;
use crate::systems::ExportSystem;

#[derive(Debug, Error)]
pub enum Error {
    #[error("pod identity lookup failed: {0}")]
    Pod(#[from] crate::pod::Error),
    #[error(transparent)]
    Kube(#[from] kube::Error),
    #[error("failed to write connection status: {0}")]
    Status(#[from] crate::status::Error),
    #[error("failed to derive status key: {0}")]
    Key(#[from] crate::error::Error),
}

pub struct Context {
    pub connections: Api<Connection>,
    pub statuses: Api<ConnectionPodStatus>,
    pub export: Arc<ExportSystem>,
    /// The single connection name this core accepts for upsert (spec §3, §6 `audit-connection`).
    pub audit_connection: String,
    pub get_pod: GetPod,
}

#[tracing::instrument(skip(ctx), fields(name = %request.name))]
pub async fn reconcile(request: ObjectRef<Connection>, ctx: Arc<Context>) -> Result<Action, Error> {
    let pod = (ctx.get_pod)().await?;
    let observed = get_or_default(&ctx.connections, &request).await?;

    if observed.is_deleted() {
        // Requeue-but-still-delete on a driver close failure (spec §4.4 step 2, §9 open question).
        let close_result = ctx.export.close_connection(&request.name);
        let key = crate::identity::key_for_connection(&pod.pod_name, &pod.namespace, &request.name)?;
        crate::status::delete_status(&ctx.statuses, &key).await?;
        return Ok(match close_result {
            Ok(()) => Action::await_change(),
            Err(_) => Action::requeue(TRANSIENT_RETRY),
        });
    }

    let obj = match observed {
        Observed::Live(obj) => obj,
        Observed::Deleted { .. } => unreachable!("handled above"),
    };
    let generation = generation_of(obj.as_ref());
    let uid = obj.uid().unwrap_or_default();

    if request.name != ctx.audit_connection {
        crate::status::upsert_connection_status(
            &ctx.statuses,
            &pod,
            &request.name,
            &uid,
            generation,
            vec![StatusError::typed(
                ERR_UPSERT_CONNECTION,
                format!(
                    "unsupported connection name {:?}, expected {:?}",
                    request.name, ctx.audit_connection
                ),
            )],
            ActiveHint::Explicit(false),
        )
        .await?;
        // The condition is stable until the object is renamed or deleted: no requeue.
        return Ok(Action::await_change());
    }

    match ctx.export.upsert_connection(&obj.spec.driver, &request.name, &obj.spec.config) {
        Ok(()) => {
            crate::status::upsert_connection_status(
                &ctx.statuses,
                &pod,
                &request.name,
                &uid,
                generation,
                Vec::new(),
                ActiveHint::Unspecified,
            )
            .await?;
            Ok(Action::await_change())
        }
        Err(driver_err) => {
            crate::status::upsert_connection_status(
                &ctx.statuses,
                &pod,
                &request.name,
                &uid,
                generation,
                vec![StatusError::typed(ERR_UPSERT_CONNECTION, driver_err.0)],
                ActiveHint::Explicit(false),
            )
            .await?;
            Ok(Action::requeue(TRANSIENT_RETRY))
        }
    }
}

pub fn error_policy(_request: &ObjectRef<Connection>, _err: &Error, _ctx: Arc<Context>) -> Action {
    Action::requeue(TRANSIENT_RETRY)
}
