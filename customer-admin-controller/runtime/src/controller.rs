use crate::{
    core::{self, namespace::is_managed_binding_name, ReconcileRequest, Reconciled, Reconciler},
    k8s::{self, ResourceExt},
    lease::{Leader, LEASE_DURATION},
    metrics::ReconcileMetrics,
    store::KubeStore,
};
use futures::prelude::*;
use kube::runtime::{
    controller::{Action, Controller},
    reflector::ObjectRef,
    watcher,
};
use std::sync::Arc;
use tokio::time;
use tracing::{debug, error, info, info_span, Instrument};

/// Shared state for both controllers.
pub struct Context {
    reconciler: Reconciler<KubeStore>,
    metrics: ReconcileMetrics,
    leader: Leader,
    timeout: time::Duration,
    retry_interval: time::Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Converge(#[from] core::Error),

    #[error("reconciliation timed out after {0:?}")]
    Timeout(time::Duration),
}

/// The kind of object whose change triggered a reconciliation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Kind {
    Namespace,
    RoleBinding,
}

// === impl Context ===

impl Context {
    pub(crate) fn new(
        reconciler: Reconciler<KubeStore>,
        metrics: ReconcileMetrics,
        leader: Leader,
        timeout: time::Duration,
        retry_interval: time::Duration,
    ) -> Self {
        Self {
            reconciler,
            metrics,
            leader,
            timeout,
            retry_interval,
        }
    }

    async fn reconcile(&self, kind: Kind, req: ReconcileRequest) -> Result<Action, Error> {
        if !self.leader.is_current() {
            debug!("Not the leader; deferring");
            return Ok(Action::requeue(LEASE_DURATION));
        }

        let start = time::Instant::now();
        let converge = async {
            match kind {
                Kind::Namespace => self.reconciler.reconcile_namespace(&req).await,
                Kind::RoleBinding => self.reconciler.reconcile_role_binding(&req).await,
            }
        };
        let res = match time::timeout(self.timeout, converge).await {
            Ok(res) => res.map_err(Error::from),
            Err(_) => Err(Error::Timeout(self.timeout)),
        };
        self.metrics.observe(kind, start.elapsed(), &res);

        match res? {
            Reconciled::Skipped(skip) => debug!(?skip, "Skipped"),
            reconciled if reconciled.is_mutated() => info!("Converged"),
            _ => debug!("Already converged"),
        }
        Ok(Action::await_change())
    }
}

// === impl Error ===

impl Error {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Converge(error) => error.is_retryable(),
            Self::Timeout(_) => true,
        }
    }
}

// === impl Kind ===

impl Kind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Namespace => "namespace",
            Self::RoleBinding => "rolebinding",
        }
    }
}

/// Runs the namespace-triggered controller.
///
/// Managed RoleBindings are also mapped to their namespace so that a deleted
/// binding is recreated.
pub(crate) async fn namespaces(client: k8s::Client, ctx: Arc<Context>) {
    let namespaces = k8s::Api::<k8s::Namespace>::all(client.clone());
    let bindings = k8s::Api::<k8s::RoleBinding>::all(client);
    Controller::new(namespaces, watcher::Config::default())
        .watches(bindings, watcher::Config::default(), |rb| {
            let ns = rb.namespace()?;
            is_managed_binding_name(&rb.name_any()).then(|| ObjectRef::new(&ns))
        })
        .run(reconcile_namespace, error_policy::<k8s::Namespace>, ctx)
        .for_each(|res| {
            if let Err(error) = res {
                debug!(%error, "Namespace controller");
            }
            future::ready(())
        })
        .await
}

/// Runs the RoleBinding-triggered controller.
pub(crate) async fn role_bindings(client: k8s::Client, ctx: Arc<Context>) {
    let bindings = k8s::Api::<k8s::RoleBinding>::all(client);
    Controller::new(bindings, watcher::Config::default())
        .run(reconcile_role_binding, error_policy::<k8s::RoleBinding>, ctx)
        .for_each(|res| {
            if let Err(error) = res {
                debug!(%error, "RoleBinding controller");
            }
            future::ready(())
        })
        .await
}

async fn reconcile_namespace(ns: Arc<k8s::Namespace>, ctx: Arc<Context>) -> Result<Action, Error> {
    let req = ReconcileRequest::namespace(ns.name_any());
    let span = info_span!("reconcile", kind = "namespace", namespace = %req.name);
    ctx.reconcile(Kind::Namespace, req).instrument(span).await
}

async fn reconcile_role_binding(
    rb: Arc<k8s::RoleBinding>,
    ctx: Arc<Context>,
) -> Result<Action, Error> {
    let req = ReconcileRequest::role_binding(rb.namespace().unwrap_or_default(), rb.name_any());
    let span = info_span!(
        "reconcile",
        kind = "rolebinding",
        namespace = %req.namespace,
        name = %req.name
    );
    ctx.reconcile(Kind::RoleBinding, req).instrument(span).await
}

fn error_policy<K>(_: Arc<K>, error: &Error, ctx: Arc<Context>) -> Action {
    if error.is_retryable() {
        info!(%error, "Reconciliation failed; retrying");
        return Action::requeue(ctx.retry_interval);
    }
    error!(%error, "Reconciliation failed");
    Action::await_change()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StoreError;

    #[test]
    fn retry_classification() {
        let conflict = Error::from(core::Error::Store(StoreError::Conflict(
            "the object has been modified".to_string(),
        )));
        assert!(conflict.is_retryable());

        let miss = Error::from(core::Error::CatalogMiss("customer-edit".to_string()));
        assert!(!miss.is_retryable());

        assert!(Error::Timeout(time::Duration::from_secs(1)).is_retryable());
    }

    #[test]
    fn kind_labels() {
        assert_eq!(Kind::Namespace.as_str(), "namespace");
        assert_eq!(Kind::RoleBinding.as_str(), "rolebinding");
    }
}
