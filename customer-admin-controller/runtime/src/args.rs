use crate::{
    controller::{self, Context},
    core::Reconciler,
    lease::{self, Leader},
    metrics::ReconcileMetrics,
    store::KubeStore,
};
use anyhow::{bail, Result};
use clap::Parser;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{info, info_span, Instrument};

#[derive(Debug, Parser)]
#[clap(
    name = "customer-admin-controller",
    about = "Keeps customer RoleBindings converged in every managed namespace"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "customer_admin=info,warn",
        env = "CUSTOMER_ADMIN_CONTROLLER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// Namespace the controller is deployed in; holds the leader Lease.
    #[clap(long, default_value = "openshift-customer-admin")]
    controller_namespace: String,

    /// Name of the controller's Deployment, used as the Lease owner.
    #[clap(long, default_value = "customer-admin-controller")]
    deployment_name: String,

    /// Identity used when claiming the Lease. Defaults to the pod name.
    #[clap(long, env = "HOSTNAME")]
    hostname: Option<String>,

    /// Run without leader election. Only safe with a single replica.
    #[clap(long)]
    disable_leader_election: bool,

    /// Upper bound on a single reconciliation, including all API calls.
    #[clap(long, default_value = "10000")]
    reconcile_timeout_ms: u64,

    /// Delay before a failed reconciliation is retried.
    #[clap(long, default_value = "5000")]
    retry_interval_ms: u64,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            client,
            admin,
            controller_namespace,
            deployment_name,
            hostname,
            disable_leader_election,
            reconcile_timeout_ms,
            retry_interval_ms,
        } = self;

        let mut prom = <Registry>::default();
        let metrics = ReconcileMetrics::register(prom.sub_registry_with_prefix("customer_admin"));
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        let leader = if disable_leader_election {
            info!("Leader election disabled");
            Leader::Always
        } else {
            let Some(hostname) = hostname else {
                bail!("--hostname (or HOSTNAME) is required for leader election");
            };
            lease::init(
                &runtime,
                &controller_namespace,
                &deployment_name,
                &hostname,
            )
            .await?
        };

        let ctx = Arc::new(Context::new(
            Reconciler::new(KubeStore::new(runtime.client())),
            metrics,
            leader,
            Duration::from_millis(reconcile_timeout_ms),
            Duration::from_millis(retry_interval_ms),
        ));

        tokio::spawn(
            controller::namespaces(runtime.client(), ctx.clone())
                .instrument(info_span!("namespaces")),
        );
        tokio::spawn(
            controller::role_bindings(runtime.client(), ctx)
                .instrument(info_span!("rolebindings")),
        );

        // Block the main thread on the shutdown signal.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}
