//! Ephemeral-pod command execution: create a short-lived pod, wait for
//! it to finish, collect its logs, and always delete it — even if the
//! caller is cancelled mid-wait. Grounded in
//! `pseudoflow/kube/exec.py::run_pod_and_get_logs`.

use super::ExecPodSpec;
use crate::Result;
use crate::constants::{EXEC_POD_DELETE_GRACE_SECONDS, EXEC_POD_POLL_INTERVAL_SECS};
use crate::error::{ClusterError, EngineError};
use k8s_openapi::api::core::v1::{Container, HostPathVolumeSource, Pod, PodSpec, Toleration, Volume, VolumeMount};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Client;
use kube::api::{Api, DeleteParams, LogParams, PostParams};
use rand::Rng;
use std::time::Duration;

/// Deletes its pod on drop, so the pod is cleaned up even if the future
/// holding this guard is dropped mid-poll (e.g. by an outer
/// `tokio::time::timeout` firing). `Drop` is synchronous, so the
/// cancelled-path deletion is a detached `tokio::spawn`; the normal
/// path calls `delete_now` and disarms the guard so the pod isn't
/// deleted twice.
struct PodCleanupGuard {
    pods: Api<Pod>,
    name: String,
    delete_params: DeleteParams,
    armed: bool,
}

impl PodCleanupGuard {
    fn new(pods: Api<Pod>, name: String, delete_params: DeleteParams) -> Self {
        Self {
            pods,
            name,
            delete_params,
            armed: true,
        }
    }

    async fn delete_now(mut self) {
        self.armed = false;
        if let Err(e) = self.pods.delete(&self.name, &self.delete_params).await {
            tracing::debug!("failed to delete exec pod {}: {e}", self.name);
        }
    }
}

impl Drop for PodCleanupGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let pods = self.pods.clone();
        let name = self.name.clone();
        let delete_params = self.delete_params.clone();
        tokio::spawn(async move {
            if let Err(e) = pods.delete(&name, &delete_params).await {
                tracing::debug!("failed to delete cancelled exec pod {name}: {e}");
            }
        });
    }
}

/// Run `spec.command` to completion in a throwaway pod and return its
/// captured log output. Always deletes the pod afterward, whether the
/// command succeeded, failed, or this future was cancelled.
pub async fn run_pod_and_get_logs(client: &Client, spec: ExecPodSpec) -> Result<String> {
    let pods: Api<Pod> = Api::namespaced(client.clone(), &spec.namespace);
    let name = format!("pseudoflow-exec-{}", random_suffix());

    let pod = build_pod(&name, &spec);
    pods.create(&PostParams::default(), &pod)
        .await
        .map_err(ClusterError::Kube)?;

    let delete_params = DeleteParams {
        grace_period_seconds: Some(EXEC_POD_DELETE_GRACE_SECONDS.max(0) as u32),
        ..Default::default()
    };
    let guard = PodCleanupGuard::new(pods.clone(), name.clone(), delete_params);

    let result = poll_until_done(&pods, &name, spec.timeout_seconds).await;

    let logs = pods
        .logs(&name, &LogParams::default())
        .await
        .unwrap_or_default();

    guard.delete_now().await;

    match result {
        Ok(PodOutcome::Succeeded) => Ok(logs),
        Ok(PodOutcome::Failed) => Err(EngineError::exec_failed(logs)),
        Err(e) => Err(e),
    }
}

enum PodOutcome {
    Succeeded,
    Failed,
}

async fn poll_until_done(pods: &Api<Pod>, name: &str, timeout_seconds: u64) -> Result<PodOutcome> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(timeout_seconds.max(1));
    loop {
        let pod = pods.get(name).await.map_err(ClusterError::Kube)?;
        let phase = pod
            .status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .unwrap_or("Pending")
            .to_string();

        match phase.as_str() {
            "Succeeded" => return Ok(PodOutcome::Succeeded),
            "Failed" => return Ok(PodOutcome::Failed),
            _ => {}
        }

        if tokio::time::Instant::now() >= deadline {
            return Err(EngineError::timeout_expired(format!(
                "exec pod {name} did not finish within {timeout_seconds}s"
            )));
        }

        tokio::time::sleep(Duration::from_secs(EXEC_POD_POLL_INTERVAL_SECS)).await;
    }
}

fn build_pod(name: &str, spec: &ExecPodSpec) -> Pod {
    let mut volumes = Vec::new();
    let mut mounts = Vec::new();
    for (idx, (host_path, mount_path)) in spec.host_path_mounts.iter().enumerate() {
        let vol_name = format!("hostpath-{idx}");
        volumes.push(Volume {
            name: vol_name.clone(),
            host_path: Some(HostPathVolumeSource {
                path: host_path.clone(),
                type_: None,
            }),
            ..Default::default()
        });
        mounts.push(VolumeMount {
            name: vol_name,
            mount_path: mount_path.clone(),
            ..Default::default()
        });
    }

    let node_selector = spec
        .node_selector
        .as_ref()
        .map(|sel| sel.to_label_map());

    let tolerations = if node_selector.is_some() {
        Some(vec![Toleration {
            operator: Some("Exists".to_string()),
            ..Default::default()
        }])
    } else {
        None
    };

    let security_context = spec.privileged.then(|| {
        k8s_openapi::api::core::v1::SecurityContext {
            privileged: Some(true),
            ..Default::default()
        }
    });

    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(spec.namespace.clone()),
            ..Default::default()
        },
        spec: Some(PodSpec {
            restart_policy: Some("Never".to_string()),
            host_network: Some(spec.privileged),
            node_selector,
            tolerations,
            containers: vec![Container {
                name: "runner".to_string(),
                image: Some(spec.image.clone()),
                command: Some(vec!["sh".to_string(), "-lc".to_string(), spec.command.clone()]),
                security_context,
                volume_mounts: (!mounts.is_empty()).then_some(mounts),
                ..Default::default()
            }],
            volumes: (!volumes.is_empty()).then_some(volumes),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn random_suffix() -> String {
    const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..8)
        .map(|_| CHARS[rng.random_range(0..CHARS.len())] as char)
        .collect()
}
