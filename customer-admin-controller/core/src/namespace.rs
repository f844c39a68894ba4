use once_cell::sync::Lazy;
use regex::Regex;

// Matches system-reserved namespaces by prefix, e.g. `kube-system`,
// `openshift-monitoring`, `default`.
static RESTRICTED_NAMESPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(kube|openshift|default|kubernetes)-?").expect("must compile")
});

static MANAGED_BINDING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^customer-(admin|view|admin-project)$").expect("must compile"));

/// Returns true if the namespace is reserved for the platform and must never
/// be reconciled.
pub fn is_restricted(name: &str) -> bool {
    RESTRICTED_NAMESPACE.is_match(name)
}

/// Returns true if the RoleBinding name is one of the catalog's bindings.
pub fn is_managed_binding_name(name: &str) -> bool {
    MANAGED_BINDING.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::kube("kube")]
    #[case::kube_system("kube-system")]
    #[case::kube_public("kube-public")]
    #[case::kube_prefix("kubeflow")]
    #[case::openshift("openshift")]
    #[case::openshift_dash("openshift-monitoring")]
    #[case::default("default")]
    #[case::kubernetes("kubernetes-dashboard")]
    #[case::upper("KUBE-SYSTEM")]
    #[case::mixed("OpenShift-Config")]
    fn restricted(#[case] name: &str) {
        assert!(is_restricted(name), "{name} must be restricted");
    }

    #[rstest]
    #[case::tenant("team-a")]
    #[case::embedded_kube("my-kube")]
    #[case::embedded_default("not-default")]
    #[case::empty("")]
    fn not_restricted(#[case] name: &str) {
        assert!(!is_restricted(name), "{name} must not be restricted");
    }

    #[rstest]
    #[case::admin("customer-admin")]
    #[case::admin_project("customer-admin-project")]
    #[case::view("customer-view")]
    #[case::upper("CUSTOMER-VIEW")]
    fn managed(#[case] name: &str) {
        assert!(is_managed_binding_name(name));
    }

    #[rstest]
    #[case::edit("customer-edit")]
    #[case::prefix("customer-admin-extra")]
    #[case::suffix("x-customer-admin")]
    #[case::admin("admin")]
    #[case::empty("")]
    fn unmanaged(#[case] name: &str) {
        assert!(!is_managed_binding_name(name));
    }
}
