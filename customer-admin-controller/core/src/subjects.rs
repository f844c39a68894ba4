//! Computes and applies the subject gap between a catalog definition and an
//! observed RoleBinding.

use crate::{
    catalog::BindingDefinition,
    k8s::{RoleBinding, Subject},
};

/// Returns the desired subjects that are absent from `observed`.
///
/// Subjects are compared by name only. If the observed role reference differs
/// from the desired one, nothing is missing: a drifted role reference needs a
/// human, not a repair.
pub fn missing(desired: &BindingDefinition, observed: &RoleBinding) -> Vec<Subject> {
    if !desired.role_ref_matches(&observed.role_ref) {
        return Vec::new();
    }

    let existing = observed.subjects.as_deref().unwrap_or_default();
    desired
        .subjects()
        .into_iter()
        .filter(|want| !contains_name(existing, &want.name))
        .collect()
}

/// Appends `missing` to the observed subjects, preserving their order and
/// skipping any subject whose name is already present.
pub fn merge(observed: &RoleBinding, missing: impl IntoIterator<Item = Subject>) -> Vec<Subject> {
    let mut merged = observed.subjects.clone().unwrap_or_default();
    for subject in missing {
        if !contains_name(&merged, &subject.name) {
            merged.push(subject);
        }
    }
    merged
}

fn contains_name(subjects: &[Subject], name: &str) -> bool {
    subjects.iter().any(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog,
        k8s::{ObjectMeta, RoleRef},
    };
    use pretty_assertions::assert_eq;

    fn group(name: &str) -> Subject {
        Subject {
            api_group: Some("rbac.authorization.k8s.io".to_string()),
            kind: "Group".to_string(),
            name: name.to_string(),
            namespace: None,
        }
    }

    fn user(name: &str) -> Subject {
        Subject {
            api_group: Some("rbac.authorization.k8s.io".to_string()),
            kind: "User".to_string(),
            name: name.to_string(),
            namespace: None,
        }
    }

    fn mk_binding(role: &str, subjects: Option<Vec<Subject>>) -> RoleBinding {
        RoleBinding {
            metadata: ObjectMeta {
                name: Some("customer-admin".to_string()),
                namespace: Some("ns-0".to_string()),
                resource_version: Some("42".to_string()),
                ..Default::default()
            },
            role_ref: RoleRef {
                api_group: "rbac.authorization.k8s.io".to_string(),
                kind: "ClusterRole".to_string(),
                name: role.to_string(),
            },
            subjects,
        }
    }

    fn admin() -> &'static BindingDefinition {
        catalog::lookup("customer-admin").expect("binding must be in the catalog")
    }

    #[test]
    fn absent_subject_list_is_missing_everything() {
        let observed = mk_binding("admin", None);
        assert_eq!(missing(admin(), &observed), vec![group("customer-admins")]);
    }

    #[test]
    fn complete_binding_is_missing_nothing() {
        let observed = mk_binding("admin", Some(vec![user("alice"), group("customer-admins")]));
        assert!(missing(admin(), &observed).is_empty());
    }

    #[test]
    fn membership_is_by_name_only() {
        // A User with the group's name counts as present.
        let observed = mk_binding("admin", Some(vec![user("customer-admins")]));
        assert!(missing(admin(), &observed).is_empty());
    }

    #[test]
    fn role_ref_drift_is_never_repaired() {
        let observed = mk_binding("edit", Some(vec![]));
        assert!(missing(admin(), &observed).is_empty());

        let mut observed = mk_binding("admin", Some(vec![]));
        observed.role_ref.kind = "Role".to_string();
        assert!(missing(admin(), &observed).is_empty());
    }

    #[test]
    fn merge_appends_after_existing() {
        let observed = mk_binding("admin", Some(vec![user("bob"), user("alice")]));
        let add = missing(admin(), &observed);
        assert_eq!(
            merge(&observed, add.clone()),
            vec![user("bob"), user("alice"), group("customer-admins")]
        );
    }

    #[test]
    fn merge_never_duplicates() {
        let observed = mk_binding("admin", Some(vec![group("customer-admins")]));
        assert_eq!(
            merge(&observed, vec![group("customer-admins"), user("x"), user("x")]),
            vec![group("customer-admins"), user("x")]
        );
    }

    #[test]
    fn merge_is_monotonic() {
        let cases = vec![
            None,
            Some(vec![]),
            Some(vec![user("a")]),
            Some(vec![group("customer-admins"), user("a")]),
            Some(vec![user("a"), user("b"), group("customer-readers")]),
        ];
        for def in catalog::definitions() {
            for subjects in &cases {
                let observed = mk_binding(def.role_ref.name, subjects.clone());
                let add = missing(def, &observed);
                let merged = merge(&observed, add.clone());

                let before = observed.subjects.clone().unwrap_or_default();
                assert_eq!(&merged[..before.len()], &before[..]);
                assert_eq!(&merged[before.len()..], &add[..]);
                assert!(missing(def, &RoleBinding {
                    subjects: Some(merged),
                    ..observed.clone()
                })
                .is_empty());
            }
        }
    }
}
