pub(crate) mod mock;

use kfp_install_model::constants::CLUSTER_ADMIN_BINDING;
use kfp_install_model::preflight::CheckState;
use kfp_install_model::rbac::bind_cluster_admin;
use kfp_install_model::status::{application_exists, proxy_hostname, watch};
use kfp_install_model::system::cluster_admin_binding;
use kfp_install_model::uninstall::uninstall;
use kfp_install_model::{
    preflight, ApplicationInstance, BindingOutcome, ClusterProvisioner, ClusterSpec,
    CreationPolicy, CrdSource, Deployer, DeployerParameters, Error, InstallManager, InstallPlan,
    ManagedStorage, ProvisionOutcome, Requirements, RolloutState, Tool, UninstallOutcome,
    WatchOptions,
};
use mock::cluster_api::MockClusterApi;
use mock::tool_runner::{fail, ok, MockToolRunner};
use mock::{pod, waiting_pod, APPLICATION_CRD};
use std::io::Write;
use std::time::Duration;

const ACCOUNT: &str = "someone@example.com";

const RUNNING_CLUSTER: &str = r#"{
    "name": "kfp",
    "status": "RUNNING",
    "currentMasterVersion": "1.24.10-gke.2300",
    "currentNodeCount": 3,
    "nodeConfig": { "machineType": "n1-standard-2" }
}"#;

fn fast_watch() -> WatchOptions {
    WatchOptions {
        interval: Duration::from_millis(5),
        timeout: Duration::from_secs(5),
    }
}

fn crd_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(APPLICATION_CRD.as_bytes()).unwrap();
    file
}

fn plan(crd: &tempfile::NamedTempFile) -> InstallPlan {
    InstallPlan {
        cluster: None,
        creation_policy: CreationPolicy::IfNotExists,
        requirements: Requirements::default(),
        account: None,
        crd_source: CrdSource::File(crd.path().to_path_buf()),
        parameters: DeployerParameters::new(ApplicationInstance::default(), None).unwrap(),
        deployer_image: "gcr.io/example/deployer:1.0".to_string(),
        wait: Some(fast_watch()),
    }
}

#[tokio::test]
async fn preflight_reports_missing_tools() {
    let runner = MockToolRunner::logged_in(ACCOUNT).missing(Tool::Mpdev);
    let report = preflight(&runner, &Requirements::default()).await.unwrap();

    assert!(!report.is_ready());
    let failures: Vec<&str> = report.failures().map(|c| c.name.as_str()).collect();
    assert_eq!(vec!["mpdev"], failures);
    assert_eq!(Some(ACCOUNT.to_string()), report.account);
    assert!(runner.called(Tool::Gcloud, &["auth", "configure-docker"]));
    assert!(report.to_table().contains("mpdev"));

    match report.into_result() {
        Err(Error::Preflight { failures }) => {
            assert_eq!(1, failures.len());
            assert!(failures[0].starts_with("mpdev"));
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[tokio::test]
async fn preflight_requires_login() {
    let runner = MockToolRunner::new().respond(
        Tool::Gcloud,
        &["config", "get-value", "account"],
        ok("(unset)\n"),
    );
    let report = preflight(&runner, &Requirements::default()).await.unwrap();
    let failures: Vec<&str> = report.failures().map(|c| c.name.as_str()).collect();
    assert_eq!(vec!["gcloud account"], failures);
    assert_eq!(None, report.account);
}

#[tokio::test]
async fn preflight_skips_gcloud_checks_without_gcloud() {
    let runner = MockToolRunner::new().missing(Tool::Gcloud);
    let report = preflight(&runner, &Requirements::default()).await.unwrap();
    let skipped = report
        .checks
        .iter()
        .filter(|c| c.state == CheckState::Skipped)
        .count();
    assert_eq!(2, skipped);
    assert!(!runner.called(Tool::Gcloud, &["config"]));
}

#[tokio::test]
async fn provisioner_creates_missing_cluster() {
    let runner = MockToolRunner::new().respond(
        Tool::Gcloud,
        &["container", "clusters", "describe"],
        fail(1, "ERROR: (gcloud.container.clusters.describe) ResponseError: code=404, message=Not found: NOT_FOUND"),
    );
    let mut spec = ClusterSpec::new("kfp", "us-central1-a");
    spec.machine_type = "n1-standard-4".to_string();

    let outcome = ClusterProvisioner::new(&runner)
        .ensure(&spec, CreationPolicy::IfNotExists)
        .await
        .unwrap();

    assert_eq!(ProvisionOutcome::Created, outcome);
    assert!(runner.called(
        Tool::Gcloud,
        &[
            "container",
            "clusters",
            "create",
            "kfp",
            "--zone",
            "us-central1-a",
            "--machine-type",
            "n1-standard-4",
        ]
    ));
    assert!(runner.called(
        Tool::Gcloud,
        &["container", "clusters", "get-credentials", "kfp"]
    ));
}

#[tokio::test]
async fn provisioner_reuses_existing_cluster() {
    let runner = MockToolRunner::new().respond(
        Tool::Gcloud,
        &["container", "clusters", "describe"],
        ok(RUNNING_CLUSTER),
    );
    let spec = ClusterSpec::new("kfp", "us-central1-a");
    let provisioner = ClusterProvisioner::new(&runner);

    let outcome = provisioner
        .ensure(&spec, CreationPolicy::IfNotExists)
        .await
        .unwrap();
    assert_eq!(ProvisionOutcome::Existing, outcome);
    assert!(!runner.called(Tool::Gcloud, &["container", "clusters", "create"]));

    let err = provisioner
        .ensure(&spec, CreationPolicy::Create)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ClusterExists { .. }));
}

#[tokio::test]
async fn provisioner_rejects_small_existing_cluster() {
    let runner = MockToolRunner::new().respond(
        Tool::Gcloud,
        &["container", "clusters", "describe"],
        ok(r#"{"name": "kfp", "currentNodeCount": 1, "nodeConfig": {"machineType": "g1-small"}}"#),
    );
    let err = ClusterProvisioner::new(&runner)
        .ensure(
            &ClusterSpec::new("kfp", "us-central1-a"),
            CreationPolicy::IfNotExists,
        )
        .await
        .unwrap_err();
    match err {
        Error::ClusterRequirements { reasons, .. } => assert_eq!(2, reasons.len()),
        other => panic!("unexpected error {}", other),
    }
    assert!(!runner.called(Tool::Gcloud, &["container", "clusters", "get-credentials"]));
}

#[tokio::test]
async fn provisioner_never_creates() {
    let runner = MockToolRunner::new().respond(
        Tool::Gcloud,
        &["container", "clusters", "describe"],
        fail(1, "ERROR: cluster kfp was not found"),
    );
    let err = ClusterProvisioner::new(&runner)
        .ensure(
            &ClusterSpec::new("kfp", "us-central1-a"),
            CreationPolicy::Never,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ClusterNotFound { .. }));
    assert!(!runner.called(Tool::Gcloud, &["container", "clusters", "create"]));
}

#[tokio::test]
async fn provisioner_deletes_existing_cluster() {
    let runner = MockToolRunner::new().respond(
        Tool::Gcloud,
        &["container", "clusters", "describe"],
        ok(RUNNING_CLUSTER),
    );
    let deleted = ClusterProvisioner::new(&runner)
        .delete("kfp", "us-central1-a")
        .await
        .unwrap();
    assert!(deleted);
    assert!(runner.called(
        Tool::Gcloud,
        &[
            "container",
            "clusters",
            "delete",
            "kfp",
            "--zone",
            "us-central1-a",
            "--quiet",
        ]
    ));
}

#[tokio::test]
async fn provisioner_delete_of_missing_cluster() {
    let runner = MockToolRunner::new().respond(
        Tool::Gcloud,
        &["container", "clusters", "describe"],
        fail(1, "ERROR: (gcloud.container.clusters.describe) ResponseError: code=404, message=Not found: NOT_FOUND"),
    );
    let deleted = ClusterProvisioner::new(&runner)
        .delete("kfp", "us-central1-a")
        .await
        .unwrap();
    assert!(!deleted);
    assert!(!runner.called(Tool::Gcloud, &["container", "clusters", "delete"]));
}

#[tokio::test]
async fn deployer_verifies_image() {
    let runner = MockToolRunner::new();
    Deployer::new(&runner, "gcr.io/example/deployer:1.0")
        .verify()
        .await
        .unwrap();
    assert!(runner.called(
        Tool::Mpdev,
        &["scripts/verify", "--deployer=gcr.io/example/deployer:1.0"]
    ));
}

#[tokio::test]
async fn deployer_verify_failure() {
    let runner = MockToolRunner::new().respond(
        Tool::Mpdev,
        &["scripts/verify"],
        fail(1, "verification tests failed"),
    );
    let err = Deployer::new(&runner, "gcr.io/example/deployer:1.0")
        .verify()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ToolFailed { .. }));
    assert!(err.to_string().contains("verification tests failed"));
}

#[tokio::test]
async fn cluster_admin_is_bound_once() {
    let client = MockClusterApi::new();
    assert_eq!(
        BindingOutcome::Created,
        bind_cluster_admin(&client, ACCOUNT).await.unwrap()
    );
    assert_eq!(
        BindingOutcome::AlreadyBound,
        bind_cluster_admin(&client, ACCOUNT).await.unwrap()
    );
    assert_eq!(1, client.bindings.lock().unwrap().len());
}

#[tokio::test]
async fn binding_for_someone_else_is_untouched() {
    let client = MockClusterApi::new().with_binding(cluster_admin_binding("other@example.com"));
    let outcome = bind_cluster_admin(&client, ACCOUNT).await.unwrap();
    assert_eq!(
        BindingOutcome::ExistsForOther {
            subjects: vec!["User:other@example.com".to_string()]
        },
        outcome
    );
    let bindings = client.bindings.lock().unwrap();
    let subjects = bindings[CLUSTER_ADMIN_BINDING].subjects.clone().unwrap();
    assert_eq!("other@example.com", subjects[0].name);
}

#[tokio::test]
async fn binding_to_another_role_is_untouched() {
    let mut binding = cluster_admin_binding(ACCOUNT);
    binding.role_ref.name = "view".to_string();
    let client = MockClusterApi::new().with_binding(binding);

    let outcome = bind_cluster_admin(&client, ACCOUNT).await.unwrap();
    assert_eq!(
        BindingOutcome::BindsOtherRole {
            role: "view".to_string()
        },
        outcome
    );
    let bindings = client.bindings.lock().unwrap();
    assert_eq!("view", bindings[CLUSTER_ADMIN_BINDING].role_ref.name);
}

#[tokio::test]
async fn install_runs_every_step() {
    let crd = crd_file();
    let runner = MockToolRunner::logged_in(ACCOUNT);
    let client = MockClusterApi::new()
        .then_pods(vec![pod("ml-pipeline", "Pending", false)])
        .then_pods(vec![
            pod("ml-pipeline", "Running", true),
            pod("kubeflow-pipelines-deployer", "Succeeded", false),
        ])
        .with_proxy_hostname("kubeflow", "1234-dot-us-central1.pipelines.googleusercontent.com");
    let manager = InstallManager::new(runner, client);

    let summary = manager.install(&plan(&crd)).await.unwrap();

    assert_eq!(None, summary.cluster);
    assert_eq!(BindingOutcome::Created, summary.binding);
    assert!(summary.namespace_created);
    assert_eq!(RolloutState::Ready, summary.rollout.unwrap().state);
    assert_eq!(
        Some("1234-dot-us-central1.pipelines.googleusercontent.com".to_string()),
        summary.proxy_hostname
    );
    assert_eq!(
        vec!["applications.app.k8s.io".to_string()],
        *manager.client().crds.lock().unwrap()
    );
    assert!(manager.client().namespaces.lock().unwrap().contains("kubeflow"));
    assert!(manager.runner().called(
        Tool::Mpdev,
        &[
            "scripts/install",
            "--deployer=gcr.io/example/deployer:1.0",
            r#"--parameters={"name":"kubeflow-pipelines","namespace":"kubeflow"}"#,
        ]
    ));
}

#[tokio::test]
async fn install_with_cluster_and_managed_storage() {
    let crd = crd_file();
    let runner = MockToolRunner::logged_in(ACCOUNT).respond(
        Tool::Gcloud,
        &["container", "clusters", "describe"],
        ok(RUNNING_CLUSTER),
    );
    let client = MockClusterApi::new()
        .with_namespace("kubeflow")
        .then_pods(vec![pod("ml-pipeline", "Running", true)]);
    let manager = InstallManager::new(runner, client);

    let mut plan = plan(&crd);
    plan.cluster = Some(ClusterSpec::new("kfp", "us-central1-a"));
    plan.parameters = DeployerParameters::new(
        ApplicationInstance::default(),
        Some(ManagedStorage::new("my-project:us-central1:kfp-db", "secret")),
    )
    .unwrap();

    let summary = manager.install(&plan).await.unwrap();
    assert_eq!(Some(ProvisionOutcome::Existing), summary.cluster);
    assert!(!summary.namespace_created);
    assert_eq!(None, summary.proxy_hostname);

    let calls = manager.runner().calls();
    let (_, args) = calls
        .iter()
        .find(|(tool, args)| *tool == Tool::Mpdev && args[0] == "scripts/install")
        .unwrap();
    let parameters = args[2].strip_prefix("--parameters=").unwrap();
    let parameters: serde_json::Value = serde_json::from_str(parameters).unwrap();
    assert_eq!(true, parameters["managedstorage.enabled"]);
    assert_eq!(
        "my-project:us-central1:kfp-db",
        parameters["managedstorage.cloudsqlInstanceConnectionName"]
    );
}

#[tokio::test]
async fn install_stops_at_failed_preflight() {
    let crd = crd_file();
    let runner = MockToolRunner::logged_in(ACCOUNT).missing(Tool::Docker);
    let manager = InstallManager::new(runner, MockClusterApi::new());

    let err = manager.install(&plan(&crd)).await.unwrap_err();
    match err {
        Error::Step { step, source } => {
            assert_eq!("preflight", step);
            assert!(matches!(*source, Error::Preflight { .. }));
        }
        other => panic!("unexpected error {}", other),
    }
    assert!(manager.client().crds.lock().unwrap().is_empty());
    assert!(!manager.runner().called(Tool::Mpdev, &["scripts/install"]));
}

#[tokio::test]
async fn install_reports_failed_deployer() {
    let crd = crd_file();
    let runner = MockToolRunner::logged_in(ACCOUNT).respond(
        Tool::Mpdev,
        &["scripts/install"],
        fail(1, "deployer job failed"),
    );
    let manager = InstallManager::new(runner, MockClusterApi::new());

    let err = manager.install(&plan(&crd)).await.unwrap_err();
    match err {
        Error::Step { step, source } => {
            assert_eq!("deploy", step);
            assert!(source.to_string().contains("deployer job failed"));
        }
        other => panic!("unexpected error {}", other),
    }
}

#[tokio::test]
async fn watch_fails_on_crashing_pod() {
    let client = MockClusterApi::new().then_pods(vec![
        pod("ml-pipeline", "Running", true),
        waiting_pod("proxy-agent", "CrashLoopBackOff"),
    ]);
    match watch(&client, "kubeflow", fast_watch()).await {
        Err(Error::RolloutFailed { pods, .. }) => assert_eq!(vec!["proxy-agent"], pods),
        other => panic!("unexpected result {:?}", other),
    }
}

#[tokio::test]
async fn watch_times_out() {
    let client = MockClusterApi::new().then_pods(vec![pod("mysql", "Pending", false)]);
    let options = WatchOptions {
        interval: Duration::from_millis(5),
        timeout: Duration::from_millis(30),
    };
    match watch(&client, "kubeflow", options).await {
        Err(Error::Timeout { seconds, .. }) => assert_eq!(0, seconds),
        other => panic!("unexpected result {:?}", other),
    }
}

#[tokio::test]
async fn proxy_hostname_waits_for_registration() {
    let client = MockClusterApi::new();
    assert_eq!(None, proxy_hostname(&client, "kubeflow").await.unwrap());
    let client = client.with_proxy_hostname("kubeflow", "abc.googleusercontent.com\n");
    assert_eq!(
        Some("abc.googleusercontent.com".to_string()),
        proxy_hostname(&client, "kubeflow").await.unwrap()
    );
}

#[tokio::test]
async fn uninstall_deletes_application() {
    let client = MockClusterApi::new()
        .with_namespace("kubeflow")
        .with_application("kubeflow", "kubeflow-pipelines");

    let report = uninstall(&client, "kubeflow", "kubeflow-pipelines", false)
        .await
        .unwrap();
    assert_eq!(UninstallOutcome::Deleted, report.application);
    assert!(!report.namespace_deleted);
    assert!(client.namespaces.lock().unwrap().contains("kubeflow"));

    let report = uninstall(&client, "kubeflow", "kubeflow-pipelines", true)
        .await
        .unwrap();
    assert_eq!(UninstallOutcome::NotFound, report.application);
    assert!(report.namespace_deleted);
}

#[tokio::test]
async fn application_lookup() {
    let client = MockClusterApi::new().with_application("kubeflow", "kubeflow-pipelines");
    assert!(application_exists(&client, "kubeflow", "kubeflow-pipelines")
        .await
        .unwrap());
    assert!(!application_exists(&client, "kubeflow", "other").await.unwrap());
    assert!(!application_exists(&client, "default", "kubeflow-pipelines")
        .await
        .unwrap());
}
