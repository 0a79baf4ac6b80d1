/*!

Mock implementations of [`ToolRunner`] and [`ClusterApi`] so that installations can be tested
without gcloud, mpdev or a GKE cluster.

!*/

pub(crate) mod cluster_api;
pub(crate) mod tool_runner;

use k8s_openapi::api::core::v1::{
    ContainerState, ContainerStateWaiting, ContainerStatus, Pod, PodStatus,
};
use kube::api::ObjectMeta;

/// A pod with one container.
pub(crate) fn pod(name: &str, phase: &str, ready: bool) -> Pod {
    pod_with_state(name, phase, ready, None)
}

/// A pod whose only container is waiting for `reason`.
pub(crate) fn waiting_pod(name: &str, reason: &str) -> Pod {
    pod_with_state(
        name,
        "Running",
        false,
        Some(ContainerState {
            waiting: Some(ContainerStateWaiting {
                reason: Some(reason.to_string()),
                message: None,
            }),
            ..Default::default()
        }),
    )
}

fn pod_with_state(name: &str, phase: &str, ready: bool, state: Option<ContainerState>) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("kubeflow".to_string()),
            ..Default::default()
        },
        spec: None,
        status: Some(PodStatus {
            phase: Some(phase.to_string()),
            container_statuses: Some(vec![ContainerStatus {
                name: "main".to_string(),
                ready,
                state,
                ..Default::default()
            }]),
            ..Default::default()
        }),
    }
}

pub(crate) const APPLICATION_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: applications.app.k8s.io
spec:
  group: app.k8s.io
  names:
    kind: Application
    plural: applications
  scope: Namespaced
  versions:
  - name: v1beta1
    served: true
    storage: true
    schema:
      openAPIV3Schema:
        type: object
        x-kubernetes-preserve-unknown-fields: true
"#;
