use crate::constants::{INVERSE_PROXY_CONFIG, INVERSE_PROXY_HOSTNAME_KEY};
use crate::error::{self, Result};
use crate::k8s::ClusterApi;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use log::{debug, info};
use serde::Serialize;
use serde_plain::derive_display_from_serialize;
use std::time::Duration;
use tabled::object::Segment;
use tabled::{Alignment, Modify, Style, Table, Tabled};
use tokio::time::Instant;

/// Container waiting reasons that will not resolve without intervention.
const FAILED_WAITING_REASONS: &[&str] = &[
    "CrashLoopBackOff",
    "ImagePullBackOff",
    "ErrImagePull",
    "CreateContainerConfigError",
    "InvalidImageName",
];

/// The columns reserved for everything but the message in the status table.
const FIXED_COLUMNS_WIDTH: usize = 80;
const MIN_MESSAGE_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PodState {
    Ready,
    Pending,
    Failed,
}

derive_display_from_serialize!(PodState);

/// `RolloutState` summarizes the pods of a namespace.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RolloutState {
    /// There is at least one pod and every pod is ready.
    Ready,
    /// Pods are still starting, or none exist yet.
    Progressing,
    /// At least one pod failed.
    Failed,
}

derive_display_from_serialize!(RolloutState);

/// The status of a single pod, as shown by `kubectl get pods`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct PodSummary {
    #[tabled(rename = "NAME")]
    pub name: String,
    #[tabled(rename = "PHASE")]
    pub phase: String,
    #[tabled(rename = "READY")]
    pub ready: String,
    #[tabled(rename = "RESTARTS")]
    pub restarts: i32,
    #[tabled(rename = "STATE")]
    pub state: PodState,
    #[tabled(rename = "MESSAGE")]
    pub message: String,
}

impl From<&Pod> for PodSummary {
    fn from(pod: &Pod) -> Self {
        let status = pod.status.clone().unwrap_or_default();
        let phase = status.phase.clone().unwrap_or_else(|| "Unknown".to_string());
        let containers = status.container_statuses.unwrap_or_default();
        let total = containers.len();
        let ready = containers.iter().filter(|c| c.ready).count();
        let restarts = containers.iter().map(|c| c.restart_count).sum();
        let failed_reason = containers
            .iter()
            .filter_map(|c| c.state.as_ref())
            .filter_map(|s| s.waiting.as_ref())
            .filter_map(|w| w.reason.as_deref())
            .find(|reason| FAILED_WAITING_REASONS.contains(reason));

        let state = match (phase.as_str(), failed_reason) {
            (_, Some(_)) | ("Failed", _) => PodState::Failed,
            ("Succeeded", _) => PodState::Ready,
            ("Running", _) if total > 0 && ready == total => PodState::Ready,
            _ => PodState::Pending,
        };
        let message = failed_reason
            .map(|reason| reason.to_string())
            .or_else(|| status.message.clone())
            .or_else(|| status.reason.clone())
            .unwrap_or_default();

        Self {
            name: pod.name_any(),
            phase,
            ready: format!("{}/{}", ready, total),
            restarts,
            state,
            message,
        }
    }
}

/// The pods of a namespace at one point in time.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub namespace: String,
    pub state: RolloutState,
    pub pods: Vec<PodSummary>,
}

impl StatusSnapshot {
    pub fn new<S>(namespace: S, pods: &[Pod]) -> Self
    where
        S: Into<String>,
    {
        let mut pods: Vec<PodSummary> = pods.iter().map(PodSummary::from).collect();
        pods.sort_by(|a, b| a.name.cmp(&b.name));
        let state = if pods.iter().any(|pod| pod.state == PodState::Failed) {
            RolloutState::Failed
        } else if !pods.is_empty() && pods.iter().all(|pod| pod.state == PodState::Ready) {
            RolloutState::Ready
        } else {
            RolloutState::Progressing
        };
        Self {
            namespace: namespace.into(),
            state,
            pods,
        }
    }

    pub fn failed_pods(&self) -> Vec<String> {
        self.pods
            .iter()
            .filter(|pod| pod.state == PodState::Failed)
            .map(|pod| pod.name.clone())
            .collect()
    }

    /// Create a table of the pods that fits in `width` columns.
    pub fn to_table(&self, width: usize) -> String {
        let max_message = width
            .saturating_sub(FIXED_COLUMNS_WIDTH)
            .max(MIN_MESSAGE_WIDTH);
        let rows: Vec<PodSummary> = self
            .pods
            .iter()
            .cloned()
            .map(|mut pod| {
                pod.message = truncate(&pod.message, max_message);
                pod
            })
            .collect();
        format!(
            "Namespace '{}': {}\n\n{}",
            self.namespace,
            self.state,
            Table::new(rows)
                .with(Style::blank())
                .with(Modify::new(Segment::all()).with(Alignment::left()))
        )
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        truncated.push_str("...");
        truncated
    }
}

/// How often and for how long to poll.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct WatchOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// Take one snapshot of the namespace.
pub async fn snapshot<C>(client: &C, namespace: &str) -> Result<StatusSnapshot>
where
    C: ClusterApi + ?Sized,
{
    Ok(StatusSnapshot::new(
        namespace,
        &client.list_pods(namespace).await?,
    ))
}

/// Whether the `Application` object named `name` exists. Pods can outlive a deleted application
/// until they are garbage collected, so a snapshot alone does not tell.
pub async fn application_exists<C>(client: &C, namespace: &str, name: &str) -> Result<bool>
where
    C: ClusterApi + ?Sized,
{
    Ok(client.application(namespace, name).await?.is_some())
}

/// Poll the pods in `namespace` until all are ready. Returns the final snapshot, or an error if a
/// pod fails or `options.timeout` elapses.
pub async fn watch<C>(client: &C, namespace: &str, options: WatchOptions) -> Result<StatusSnapshot>
where
    C: ClusterApi + ?Sized,
{
    let start = Instant::now();
    let mut previous: Option<StatusSnapshot> = None;
    loop {
        let current = snapshot(client, namespace).await?;
        if previous.as_ref() != Some(&current) {
            info!(
                "Namespace '{}' is {}: {}",
                namespace,
                current.state,
                current
                    .pods
                    .iter()
                    .map(|pod| format!("{} {}", pod.name, pod.state))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        match current.state {
            RolloutState::Ready => return Ok(current),
            RolloutState::Failed => {
                return error::RolloutFailedSnafu {
                    namespace,
                    pods: current.failed_pods(),
                }
                .fail()
            }
            RolloutState::Progressing => {}
        }
        if start.elapsed() + options.interval > options.timeout {
            return error::TimeoutSnafu {
                namespace,
                seconds: options.timeout.as_secs(),
            }
            .fail();
        }
        debug!("Waiting {:?} before checking '{}' again", options.interval, namespace);
        previous = Some(current);
        tokio::time::sleep(options.interval).await;
    }
}

/// The hostname of the inverse proxy that exposes the Pipelines UI, `None` until the proxy
/// agent has registered.
pub async fn proxy_hostname<C>(client: &C, namespace: &str) -> Result<Option<String>>
where
    C: ClusterApi + ?Sized,
{
    Ok(client
        .config_map(namespace, INVERSE_PROXY_CONFIG)
        .await?
        .and_then(|config_map| config_map.data)
        .and_then(|mut data| data.remove(INVERSE_PROXY_HOSTNAME_KEY))
        .map(|hostname| hostname.trim().to_string())
        .filter(|hostname| !hostname.is_empty()))
}

/// The URL of the Pipelines UI for a proxy hostname.
pub fn proxy_url(hostname: &str) -> String {
    if hostname.starts_with("https://") || hostname.starts_with("http://") {
        hostname.to_string()
    } else {
        format!("https://{}", hostname)
    }
}


#[cfg(test)]
mod test {
    use super::test_pods::pod;
    use super::*;

    #[test]
    fn pod_classification() {
        let ready = PodSummary::from(&pod("ml-pipeline", "Running", &[true, true], None));
        assert_eq!(PodState::Ready, ready.state);
        assert_eq!("2/2", ready.ready);

        let starting = PodSummary::from(&pod("ml-pipeline", "Running", &[true, false], None));
        assert_eq!(PodState::Pending, starting.state);

        let pending = PodSummary::from(&pod("mysql", "Pending", &[], None));
        assert_eq!(PodState::Pending, pending.state);
        assert_eq!("0/0", pending.ready);

        let crashing = PodSummary::from(&pod(
            "proxy-agent",
            "Running",
            &[false],
            Some("CrashLoopBackOff"),
        ));
        assert_eq!(PodState::Failed, crashing.state);
        assert_eq!("CrashLoopBackOff", crashing.message);
        assert_eq!(4, crashing.restarts);

        let done = PodSummary::from(&pod("deployer", "Succeeded", &[false], None));
        assert_eq!(PodState::Ready, done.state);

        let failed = PodSummary::from(&pod("deployer", "Failed", &[false], None));
        assert_eq!(PodState::Failed, failed.state);
    }

    #[test]
    fn rollout_state() {
        assert_eq!(
            RolloutState::Progressing,
            StatusSnapshot::new("kubeflow", &[]).state
        );
        let pods = vec![
            pod("b", "Running", &[true], None),
            pod("a", "Succeeded", &[false], None),
        ];
        let snapshot = StatusSnapshot::new("kubeflow", &pods);
        assert_eq!(RolloutState::Ready, snapshot.state);
        assert_eq!("a", snapshot.pods[0].name);

        let pods = vec![
            pod("a", "Pending", &[false], None),
            pod("b", "Running", &[false], Some("ImagePullBackOff")),
        ];
        let snapshot = StatusSnapshot::new("kubeflow", &pods);
        assert_eq!(RolloutState::Failed, snapshot.state);
        assert_eq!(vec!["b".to_string()], snapshot.failed_pods());
    }

    #[test]
    fn table_contains_pods() {
        let pods = vec![pod("ml-pipeline-ui", "Running", &[true], None)];
        let table = StatusSnapshot::new("kubeflow", &pods).to_table(120);
        assert!(table.contains("ml-pipeline-ui"));
        assert!(table.contains("NAME"));
        assert!(table.contains("ready"));
    }

    #[test]
    fn truncate_long_messages() {
        assert_eq!("short", truncate("short", 10));
        assert_eq!("abcdefg...", truncate("abcdefghijklmnop", 10));
    }

    #[test]
    fn url_from_hostname() {
        assert_eq!(
            "https://1234-dot-us-central1.pipelines.googleusercontent.com",
            proxy_url("1234-dot-us-central1.pipelines.googleusercontent.com")
        );
        assert_eq!("https://host", proxy_url("https://host"));
    }
}
