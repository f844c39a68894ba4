#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod namespace;

pub use self::namespace::Phase;
pub use k8s_openapi::api::{
    self,
    apps::v1::Deployment,
    coordination::v1::Lease,
    core::v1::{Namespace, NamespaceStatus},
    rbac::v1::{RoleBinding, RoleRef, Subject},
};
pub use kube::{
    api::{Api, ObjectMeta, PostParams, Resource, ResourceExt},
    core::ErrorResponse,
    Client, Error,
};

/// The API group of every `RoleRef` and `Group` subject the controller writes.
pub const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";
