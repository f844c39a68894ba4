//! The fixed set of RoleBindings every managed namespace must carry.

use crate::k8s::{ObjectMeta, RoleBinding, RoleRef, Subject, RBAC_API_GROUP};

/// A `(kind, name)` pair naming a principal or a role.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KindName {
    pub kind: &'static str,
    pub name: &'static str,
}

/// A namespace-independent template for one managed RoleBinding.
#[derive(Debug, PartialEq, Eq)]
pub struct BindingDefinition {
    pub name: &'static str,
    pub role_ref: KindName,
    pub subjects: &'static [KindName],
}

const CUSTOMER_ADMINS: KindName = KindName {
    kind: "Group",
    name: "customer-admins",
};

const CUSTOMER_READERS: KindName = KindName {
    kind: "Group",
    name: "customer-readers",
};

static CATALOG: [BindingDefinition; 3] = [
    BindingDefinition {
        name: "customer-admin",
        role_ref: KindName {
            kind: "ClusterRole",
            name: "admin",
        },
        subjects: &[CUSTOMER_ADMINS],
    },
    BindingDefinition {
        name: "customer-admin-project",
        role_ref: KindName {
            kind: "ClusterRole",
            name: "customer-admin-project",
        },
        subjects: &[CUSTOMER_ADMINS],
    },
    BindingDefinition {
        name: "customer-view",
        role_ref: KindName {
            kind: "ClusterRole",
            name: "view",
        },
        subjects: &[CUSTOMER_READERS],
    },
];

/// Returns the definition for a managed binding name.
///
/// Names compare case-insensitively, matching
/// [`is_managed_binding_name`](crate::namespace::is_managed_binding_name).
pub fn lookup(name: &str) -> Option<&'static BindingDefinition> {
    CATALOG.iter().find(|def| def.name.eq_ignore_ascii_case(name))
}

/// Iterates over all definitions in catalog order.
pub fn definitions() -> impl Iterator<Item = &'static BindingDefinition> {
    CATALOG.iter()
}

// === impl BindingDefinition ===

impl BindingDefinition {
    pub fn role_ref(&self) -> RoleRef {
        RoleRef {
            api_group: RBAC_API_GROUP.to_string(),
            kind: self.role_ref.kind.to_string(),
            name: self.role_ref.name.to_string(),
        }
    }

    pub fn subjects(&self) -> Vec<Subject> {
        self.subjects.iter().map(KindName::to_subject).collect()
    }

    /// Builds the complete RoleBinding for `namespace`.
    pub fn to_role_binding(&self, namespace: &str) -> RoleBinding {
        RoleBinding {
            metadata: ObjectMeta {
                name: Some(self.name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            role_ref: self.role_ref(),
            subjects: Some(self.subjects()),
        }
    }

    /// Returns true if `role_ref` names the same role as this definition.
    ///
    /// Only the kind and name are compared; the API group is not.
    pub fn role_ref_matches(&self, role_ref: &RoleRef) -> bool {
        role_ref.kind == self.role_ref.kind && role_ref.name == self.role_ref.name
    }
}

// === impl KindName ===

impl KindName {
    fn to_subject(&self) -> Subject {
        Subject {
            api_group: Some(RBAC_API_GROUP.to_string()),
            kind: self.kind.to_string(),
            name: self.name.to_string(),
            namespace: None,
        }
    }
}
