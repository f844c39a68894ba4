use crate::{
    catalog::{self, BindingDefinition},
    k8s::{Phase, RoleBinding, Subject},
    namespace,
    store::{Store, StoreError},
    subjects,
};
use tracing::{debug, info, warn};

/// Identifies the object whose change triggered a reconciliation.
///
/// Namespaces are cluster-scoped, so a namespace request carries an empty
/// `namespace` and the namespace's own name in `name`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ReconcileRequest {
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A name passed the managed-binding gate but has no catalog entry.
    #[error("RoleBinding {0} has no catalog entry")]
    CatalogMiss(String),
}

/// The result of one successful reconciliation.
#[derive(Clone, Debug, PartialEq)]
pub enum Reconciled {
    Skipped(Skip),
    Converged(Vec<BindingOutcome>),
}

/// Why a request was ignored without converging anything.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Skip {
    RestrictedNamespace,
    UnmanagedBinding,
    NamespaceNotFound,
    NamespaceTerminating,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BindingOutcome {
    pub name: &'static str,
    pub change: Change,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    Created,
    Updated { added: Vec<Subject> },
    Unchanged,
    RoleRefMismatch,
}

/// Drives namespaces and their RoleBindings toward the catalog.
///
/// Holds no state besides the store handle; concurrent invocations for
/// different keys are safe.
#[derive(Clone, Debug)]
pub struct Reconciler<S> {
    store: S,
}

// === impl ReconcileRequest ===

impl ReconcileRequest {
    pub fn namespace(name: impl Into<String>) -> Self {
        Self {
            namespace: String::new(),
            name: name.into(),
        }
    }

    pub fn role_binding(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ReconcileRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            self.name.fmt(f)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

// === impl Error ===

impl Error {
    /// Store failures are transient from the engine's point of view and
    /// should be redelivered; a catalog miss will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

// === impl Reconciled ===

impl Reconciled {
    /// Returns true if any binding was created or updated.
    pub fn is_mutated(&self) -> bool {
        match self {
            Self::Skipped(_) => false,
            Self::Converged(outcomes) => outcomes
                .iter()
                .any(|o| matches!(o.change, Change::Created | Change::Updated { .. })),
        }
    }
}

// === impl Reconciler ===

impl<S: Store> Reconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Converges every catalog binding in the namespace named by `req.name`.
    ///
    /// Bindings are converged in catalog order and the first store error
    /// aborts the invocation, leaving later bindings for the retry.
    pub async fn reconcile_namespace(&self, req: &ReconcileRequest) -> Result<Reconciled, Error> {
        let ns = req.name.as_str();
        if namespace::is_restricted(ns) {
            debug!(namespace = %ns, "Skipping restricted namespace");
            return Ok(Reconciled::Skipped(Skip::RestrictedNamespace));
        }
        if let Some(skip) = self.check_namespace(ns).await? {
            return Ok(Reconciled::Skipped(skip));
        }

        let mut outcomes = Vec::new();
        for def in catalog::definitions() {
            let change = converge_binding(&self.store, ns, def).await?;
            outcomes.push(BindingOutcome {
                name: def.name,
                change,
            });
        }
        Ok(Reconciled::Converged(outcomes))
    }

    /// Converges the single catalog binding identified by `req`.
    pub async fn reconcile_role_binding(
        &self,
        req: &ReconcileRequest,
    ) -> Result<Reconciled, Error> {
        if namespace::is_restricted(&req.namespace) {
            debug!(namespace = %req.namespace, "Skipping restricted namespace");
            return Ok(Reconciled::Skipped(Skip::RestrictedNamespace));
        }
        if !namespace::is_managed_binding_name(&req.name) {
            return Ok(Reconciled::Skipped(Skip::UnmanagedBinding));
        }
        if let Some(skip) = self.check_namespace(&req.namespace).await? {
            return Ok(Reconciled::Skipped(skip));
        }

        let def = catalog::lookup(&req.name).ok_or_else(|| Error::CatalogMiss(req.name.clone()))?;
        let change = converge_binding(&self.store, &req.namespace, def).await?;
        Ok(Reconciled::Converged(vec![BindingOutcome {
            name: def.name,
            change,
        }]))
    }

    async fn check_namespace(&self, name: &str) -> Result<Option<Skip>, StoreError> {
        match self.store.namespace(name).await? {
            None => {
                debug!(namespace = %name, "Namespace not found");
                Ok(Some(Skip::NamespaceNotFound))
            }
            Some(ns) if Phase::of(&ns).is_terminating() => {
                debug!(namespace = %name, "Namespace is terminating");
                Ok(Some(Skip::NamespaceTerminating))
            }
            Some(_) => Ok(None),
        }
    }
}

/// Brings one catalog binding in `namespace` up to date.
///
/// A missing binding is created from the catalog template. An existing
/// binding with the expected role reference gets any missing subjects
/// appended; one with a different role reference is left alone.
pub async fn converge_binding<S>(
    store: &S,
    namespace: &str,
    def: &BindingDefinition,
) -> Result<Change, StoreError>
where
    S: Store + ?Sized,
{
    let observed = match store.role_binding(namespace, def.name).await? {
        Some(rb) => rb,
        None => {
            store
                .create_role_binding(&def.to_role_binding(namespace))
                .await?;
            info!(%namespace, name = def.name, "Created RoleBinding");
            return Ok(Change::Created);
        }
    };

    if !def.role_ref_matches(&observed.role_ref) {
        warn!(
            %namespace,
            name = def.name,
            role.kind = %observed.role_ref.kind,
            role.name = %observed.role_ref.name,
            "RoleBinding references an unexpected role; leaving it untouched"
        );
        return Ok(Change::RoleRefMismatch);
    }

    let added = subjects::missing(def, &observed);
    if added.is_empty() {
        debug!(%namespace, name = def.name, "RoleBinding is up to date");
        return Ok(Change::Unchanged);
    }

    let subjects = subjects::merge(&observed, added.iter().cloned());
    let updated = RoleBinding {
        subjects: Some(subjects),
        ..observed
    };
    store.update_role_binding(&updated).await?;
    info!(%namespace, name = def.name, added = added.len(), "Updated RoleBinding subjects");
    Ok(Change::Updated { added })
}
