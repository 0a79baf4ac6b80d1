/// Helper macro to avoid retyping the API group of the Kubernetes Application resource when
/// creating further string constants from it. When given no parameters, this returns the group.
/// When given a string literal parameter it adds `/parameter` to the end.
macro_rules! app_k8s {
    () => {
        "app.k8s.io"
    };
    ($s:literal) => {
        concat!(app_k8s!(), "/", $s)
    };
}

// Application resource identifiers
pub const APPLICATION_GROUP: &str = app_k8s!();
pub const APPLICATION_VERSION: &str = "v1beta1";
pub const APPLICATION_API_VERSION: &str = app_k8s!("v1beta1");
pub const APPLICATION_KIND: &str = "Application";
pub const APPLICATION_CRD_NAME: &str = concat!("applications.", app_k8s!());
pub const APPLICATION_CRD_URL: &str = "https://raw.githubusercontent.com/GoogleCloudPlatform/marketplace-k8s-app-tools/master/crd/app-crd.yaml";

// Deployer
pub const DEFAULT_DEPLOYER_IMAGE: &str =
    "gcr.io/cloud-marketplace/google-cloud-ai-platform/kubeflow-pipelines/deployer:1.4";
pub const DEFAULT_APP_INSTANCE_NAME: &str = "kubeflow-pipelines";
pub const DEFAULT_NAMESPACE: &str = "kubeflow";

// Cluster defaults and minimums
pub const DEFAULT_MACHINE_TYPE: &str = "n1-standard-2";
pub const DEFAULT_NUM_NODES: u32 = 3;
pub const DEFAULT_SCOPES: &str = "cloud-platform";
pub const MIN_NODES: u32 = 3;
pub const MIN_VCPUS: u32 = 2;
pub const MIN_K8S_MAJOR: u8 = 1;
pub const MIN_K8S_MINOR: u8 = 9;

// RBAC
pub const CLUSTER_ADMIN_BINDING: &str = "cluster-admin-binding";
pub const CLUSTER_ADMIN_ROLE: &str = "cluster-admin";

// Inverse proxy
pub const INVERSE_PROXY_CONFIG: &str = "inverse-proxy-config";
pub const INVERSE_PROXY_HOSTNAME_KEY: &str = "Hostname";

// Standard tags https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
pub const APP_NAME: &str = "app.kubernetes.io/name";
pub const APP_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
pub const MANAGED_BY: &str = "kfp-install";

#[test]
fn application_constants_macro_test() {
    assert_eq!("app.k8s.io", app_k8s!());
    assert_eq!("app.k8s.io/v1beta1", APPLICATION_API_VERSION);
    assert_eq!("applications.app.k8s.io", APPLICATION_CRD_NAME);
}
