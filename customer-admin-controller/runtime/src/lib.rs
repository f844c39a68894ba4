#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use customer_admin_controller_core as core;
pub use customer_admin_controller_k8s_api as k8s;

mod args;
mod controller;
mod lease;
mod metrics;
mod store;

pub use self::{
    args::Args,
    controller::{Context, Error},
    metrics::ReconcileMetrics,
    store::KubeStore,
};

/// The field manager recorded on every object this controller writes.
pub const FIELD_MANAGER: &str = "customer-admin-controller";
