use crate::k8s::{Namespace, RoleBinding};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Reads and writes the cluster state the engine converges.
///
/// Lookups return `Ok(None)` when the object does not exist; not-found is
/// never an error.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn namespace(&self, name: &str) -> Result<Option<Namespace>, StoreError>;

    async fn role_binding(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<RoleBinding>, StoreError>;

    async fn create_role_binding(&self, binding: &RoleBinding) -> Result<(), StoreError>;

    /// Replaces the whole binding. The binding's resource version guards
    /// against concurrent modification.
    async fn update_role_binding(&self, binding: &RoleBinding) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("store unavailable")]
    Unavailable(#[source] BoxError),

    #[error("store request failed")]
    Other(#[source] BoxError),
}

#[async_trait::async_trait]
impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    async fn namespace(&self, name: &str) -> Result<Option<Namespace>, StoreError> {
        (**self).namespace(name).await
    }

    async fn role_binding(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<RoleBinding>, StoreError> {
        (**self).role_binding(namespace, name).await
    }

    async fn create_role_binding(&self, binding: &RoleBinding) -> Result<(), StoreError> {
        (**self).create_role_binding(binding).await
    }

    async fn update_role_binding(&self, binding: &RoleBinding) -> Result<(), StoreError> {
        (**self).update_role_binding(binding).await
    }
}
