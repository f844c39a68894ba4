use crate::k8s::{self, Deployment, Lease, ObjectMeta, Resource};
use anyhow::Result;
use kube::api::{Patch, PatchParams};
use kubert::lease::Claim;
use std::sync::Arc;
use tokio::{sync::watch, time};

pub(crate) const LEASE_DURATION: time::Duration = time::Duration::from_secs(30);
const LEASE_NAME: &str = "customer-admin-controller-write";
const RENEW_GRACE_PERIOD: time::Duration = time::Duration::from_secs(1);

/// Decides whether this replica may write RoleBindings.
#[derive(Clone, Debug)]
pub enum Leader {
    /// Leader election is disabled; this replica always writes.
    Always,
    Lease {
        claims: watch::Receiver<Arc<Claim>>,
        claimant: String,
    },
}

// === impl Leader ===

impl Leader {
    pub fn is_current(&self) -> bool {
        match self {
            Self::Always => true,
            Self::Lease { claims, claimant } => claims.borrow().is_current_for(claimant),
        }
    }
}

pub(crate) async fn init<T>(
    runtime: &kubert::Runtime<T>,
    ns: &str,
    deployment_name: &str,
    claimant: &str,
) -> Result<Leader> {
    // Fetch the controller's deployment so that we can use it as an owner
    // reference of the Lease.
    let api = k8s::Api::<Deployment>::namespaced(runtime.client(), ns);
    let deployment = api.get(deployment_name).await?;

    let lease = Lease {
        metadata: ObjectMeta {
            name: Some(LEASE_NAME.to_string()),
            namespace: Some(ns.to_string()),
            // Specifying a resource version of "0" means that we will
            // only create the Lease if it does not already exist.
            resource_version: Some("0".to_string()),
            owner_references: deployment.controller_owner_ref(&()).map(|oref| vec![oref]),
            labels: Some(
                [(
                    "app.kubernetes.io/name".to_string(),
                    deployment_name.to_string(),
                )]
                .into_iter()
                .collect(),
            ),
            ..Default::default()
        },
        spec: None,
    };
    let api = k8s::Api::<Lease>::namespaced(runtime.client(), ns);
    match api
        .patch(
            LEASE_NAME,
            &PatchParams {
                field_manager: Some(crate::FIELD_MANAGER.to_string()),
                ..Default::default()
            },
            &Patch::Apply(lease),
        )
        .await
    {
        Ok(lease) => tracing::info!(?lease, "Created Lease resource"),
        Err(k8s::Error::Api(_)) => tracing::debug!("Lease already exists, no need to create it"),
        Err(error) => {
            return Err(error.into());
        }
    };

    let params = kubert::lease::ClaimParams {
        lease_duration: LEASE_DURATION,
        renew_grace_period: RENEW_GRACE_PERIOD,
    };
    let (claims, _task) = kubert::lease::LeaseManager::init(api, LEASE_NAME)
        .await?
        .spawn(claimant, params)
        .await?;
    Ok(Leader::Lease {
        claims,
        claimant: claimant.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn leader(holder: &str, expiry: DateTime<Utc>) -> Leader {
        let claim = Claim {
            holder: holder.to_string(),
            expiry,
        };
        let (_claims_tx, claims) = watch::channel(Arc::new(claim));
        Leader::Lease {
            claims,
            claimant: "replica-0".to_string(),
        }
    }

    #[test]
    fn holder_is_leader() {
        assert!(leader("replica-0", DateTime::<Utc>::MAX_UTC).is_current());
    }

    #[test]
    fn other_holder_is_not_leader() {
        assert!(!leader("replica-1", DateTime::<Utc>::MAX_UTC).is_current());
    }

    #[test]
    fn expired_claim_is_not_leader() {
        assert!(!leader("replica-0", DateTime::<Utc>::MIN_UTC).is_current());
    }

    #[test]
    fn always_leads_without_election() {
        assert!(Leader::Always.is_current());
    }
}
