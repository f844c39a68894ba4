use crate::{
    controller::{Error, Kind},
    core::{Change, Reconciled},
};
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{
        counter::Counter,
        family::Family,
        histogram::{exponential_buckets, Histogram},
    },
    registry::{Registry, Unit},
};
use tokio::time;

#[derive(Clone, Debug)]
pub struct ReconcileMetrics {
    reconciles: Family<ReconcileLabels, Counter>,
    binding_changes: Family<ChangeLabels, Counter>,
    duration: Family<KindLabels, Histogram>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct ReconcileLabels {
    kind: &'static str,
    result: &'static str,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct ChangeLabels {
    binding: &'static str,
    change: &'static str,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct KindLabels {
    kind: &'static str,
}

// === impl ReconcileMetrics ===

impl ReconcileMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let reconciles = Family::default();
        reg.register(
            "reconciles",
            "Count of reconciliations by trigger kind and result",
            reconciles.clone(),
        );

        let binding_changes = Family::default();
        reg.register(
            "binding_changes",
            "Count of RoleBindings created or updated",
            binding_changes.clone(),
        );

        // Each reconciliation is a handful of API round trips.
        let duration = Family::<KindLabels, Histogram>::new_with_constructor(|| {
            Histogram::new(exponential_buckets(0.001, 2.0, 14))
        });
        reg.register_with_unit(
            "reconcile_duration",
            "Histogram of reconciliation latency",
            Unit::Seconds,
            duration.clone(),
        );

        Self {
            reconciles,
            binding_changes,
            duration,
        }
    }

    pub(crate) fn observe(
        &self,
        kind: Kind,
        elapsed: time::Duration,
        result: &Result<Reconciled, Error>,
    ) {
        let kind = kind.as_str();
        self.duration
            .get_or_create(&KindLabels { kind })
            .observe(elapsed.as_secs_f64());

        let result = match result {
            Ok(Reconciled::Skipped(_)) => "skipped",
            Ok(Reconciled::Converged(outcomes)) => {
                for outcome in outcomes {
                    let change = match outcome.change {
                        Change::Created => "created",
                        Change::Updated { .. } => "updated",
                        Change::Unchanged | Change::RoleRefMismatch => continue,
                    };
                    self.binding_changes
                        .get_or_create(&ChangeLabels {
                            binding: outcome.name,
                            change,
                        })
                        .inc();
                }
                "converged"
            }
            Err(_) => "error",
        };
        self.reconciles
            .get_or_create(&ReconcileLabels { kind, result })
            .inc();
    }
}
