#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Converges the customer-facing RoleBindings of every managed namespace.
//!
//! The engine is a stateless function of a [`ReconcileRequest`] and the state
//! read through a [`Store`]. It creates missing bindings and appends missing
//! subjects; it never deletes, never revokes access, and never rewrites a
//! binding whose role reference differs from the catalog's.

pub mod catalog;
mod converge;
pub mod namespace;
pub mod store;
pub mod subjects;


pub use self::{
    catalog::BindingDefinition,
    converge::{
        converge_binding, BindingOutcome, Change, Error, ReconcileRequest, Reconciled,
        Reconciler, Skip,
    },
    store::{Store, StoreError},
};
pub use customer_admin_controller_k8s_api as k8s;
