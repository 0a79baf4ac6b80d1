//! Kubernetes object definitions created by the installer.

use crate::constants::{
    APP_MANAGED_BY, APP_NAME, CLUSTER_ADMIN_BINDING, CLUSTER_ADMIN_ROLE, DEFAULT_APP_INSTANCE_NAME,
    MANAGED_BY,
};
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleRef, Subject};
use kube::api::ObjectMeta;
use maplit::btreemap;

/// Defines the namespace the application is deployed into
pub fn application_namespace(name: &str) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(btreemap! {
                APP_NAME.to_string() => DEFAULT_APP_INSTANCE_NAME.to_string(),
                APP_MANAGED_BY.to_string() => MANAGED_BY.to_string(),
            }),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Defines the binding that grants `account` the cluster-admin role. The deployer needs it to
/// create cluster scoped objects.
pub fn cluster_admin_binding(account: &str) -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: ObjectMeta {
            name: Some(CLUSTER_ADMIN_BINDING.to_string()),
            labels: Some(btreemap! {
                APP_MANAGED_BY.to_string() => MANAGED_BY.to_string(),
            }),
            ..Default::default()
        },
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_string(),
            kind: "ClusterRole".to_string(),
            name: CLUSTER_ADMIN_ROLE.to_string(),
        },
        subjects: Some(vec![user_subject(account)]),
    }
}

pub(crate) fn user_subject(account: &str) -> Subject {
    Subject {
        api_group: Some("rbac.authorization.k8s.io".to_string()),
        kind: "User".to_string(),
        name: account.to_string(),
        namespace: None,
    }
}

#[test]
fn binding_matches_kubectl() {
    let binding = cluster_admin_binding("someone@example.com");
    assert_eq!(Some(CLUSTER_ADMIN_BINDING.to_string()), binding.metadata.name);
    assert_eq!(CLUSTER_ADMIN_ROLE, binding.role_ref.name);
    let subjects = binding.subjects.unwrap();
    assert_eq!(1, subjects.len());
    assert_eq!("User", subjects[0].kind);
    assert_eq!("someone@example.com", subjects[0].name);
}
