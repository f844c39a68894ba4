use crate::{
    core::{Store, StoreError},
    k8s::{self, Namespace, PostParams, RoleBinding},
    FIELD_MANAGER,
};

/// A [`Store`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeStore {
    client: k8s::Client,
}

impl KubeStore {
    pub fn new(client: k8s::Client) -> Self {
        Self { client }
    }

    fn role_bindings(&self, namespace: &str) -> k8s::Api<RoleBinding> {
        k8s::Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait::async_trait]
impl Store for KubeStore {
    async fn namespace(&self, name: &str) -> Result<Option<Namespace>, StoreError> {
        k8s::Api::<Namespace>::all(self.client.clone())
            .get_opt(name)
            .await
            .map_err(store_error)
    }

    async fn role_binding(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<RoleBinding>, StoreError> {
        self.role_bindings(namespace)
            .get_opt(name)
            .await
            .map_err(store_error)
    }

    async fn create_role_binding(&self, binding: &RoleBinding) -> Result<(), StoreError> {
        let namespace = binding
            .metadata
            .namespace
            .as_deref()
            .ok_or_else(|| StoreError::Other("RoleBinding must have a namespace".into()))?;
        self.role_bindings(namespace)
            .create(&post_params(), binding)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn update_role_binding(&self, binding: &RoleBinding) -> Result<(), StoreError> {
        let (Some(namespace), Some(name)) = (
            binding.metadata.namespace.as_deref(),
            binding.metadata.name.as_deref(),
        ) else {
            return Err(StoreError::Other(
                "RoleBinding must have a namespace and name".into(),
            ));
        };
        self.role_bindings(namespace)
            .replace(name, &post_params(), binding)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

fn post_params() -> PostParams {
    PostParams {
        dry_run: false,
        field_manager: Some(FIELD_MANAGER.to_string()),
    }
}

/// Classifies a Kubernetes client error so callers can decide how to retry.
fn store_error(error: k8s::Error) -> StoreError {
    match error {
        k8s::Error::Api(rsp) => match rsp.code {
            409 => StoreError::Conflict(rsp.message),
            401 | 403 => StoreError::Forbidden(rsp.message),
            429 | 500..=599 => StoreError::Unavailable(Box::new(k8s::Error::Api(rsp))),
            _ => StoreError::Other(Box::new(k8s::Error::Api(rsp))),
        },
        error @ (k8s::Error::HyperError(_) | k8s::Error::Service(_)) => {
            StoreError::Unavailable(Box::new(error))
        }
        error => StoreError::Other(Box::new(error)),
    }
}
