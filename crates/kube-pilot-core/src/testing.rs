//! In-memory cluster used by the engine's tests

use crate::formatting::parse_timestamp;
use crate::navigation::base_type;
use chrono::{DateTime, Utc};
use kubectl_rs::{ClusterClient, KubectlError, LogsRequest, PodList, Scope};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub fn fixed_now() -> DateTime<Utc> {
    parse_timestamp("2024-03-02T01:01:01Z").unwrap_or_default()
}

const PODS_JSON: &str = r#"{
    "items": [
        {
            "metadata": {"name": "web-7f9", "creationTimestamp": "2024-03-01T00:00:00Z"},
            "spec": {"containers": [
                {"name": "app", "image": "nginx:1.25"},
                {"name": "sidecar", "image": "envoy:1.29"}
            ]},
            "status": {
                "phase": "Running",
                "containerStatuses": [
                    {"name": "app", "ready": true, "state": {"running": {}}},
                    {"name": "sidecar", "ready": true, "state": {"running": {}}}
                ]
            }
        },
        {
            "metadata": {"name": "api-5c2", "creationTimestamp": "2024-03-02T01:00:00Z"},
            "spec": {"containers": [{"name": "api", "image": "api:2.0"}]},
            "status": {
                "phase": "Running",
                "containerStatuses": [{
                    "name": "api", "ready": false, "restartCount": 4,
                    "state": {"waiting": {"reason": "CrashLoopBackOff"}}
                }]
            }
        }
    ]
}"#;

/// Records every call; `offline` makes fetches fail, `failing` makes
/// mutations fail
pub struct FakeCluster {
    pods: PodList,
    current: Mutex<String>,
    ops: Mutex<Vec<String>>,
    calls: AtomicUsize,
    offline: AtomicBool,
    failing: AtomicBool,
}

impl FakeCluster {
    pub fn with_web_pod() -> Self {
        Self {
            pods: PodList::from_json(PODS_JSON).unwrap_or_default(),
            current: Mutex::new("prod".to_string()),
            ops: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of cluster calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Recorded side-effecting operations
    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().map(|ops| ops.clone()).unwrap_or_default()
    }

    pub fn current(&self) -> String {
        self.current.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn fetch(&self) -> Result<(), KubectlError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(KubectlError::CommandFailed {
                command: "kubectl get".to_string(),
                stderr: "dial tcp 10.0.0.1:6443: connect: connection refused".to_string(),
            });
        }
        Ok(())
    }

    fn mutate(&self, op: String) -> Result<(), KubectlError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(KubectlError::CommandFailed {
                command: op,
                stderr: "Error from server (Forbidden): forbidden".to_string(),
            });
        }
        if let Ok(mut ops) = self.ops.lock() {
            ops.push(op);
        }
        Ok(())
    }
}

impl ClusterClient for FakeCluster {
    async fn list_pods(&self, _scope: &Scope) -> Result<PodList, KubectlError> {
        self.fetch()?;
        Ok(self.pods.clone())
    }

    async fn get_table(&self, _scope: &Scope, resource_type: &str) -> Result<String, KubectlError> {
        self.fetch()?;
        Ok(match base_type(resource_type) {
            "secrets" => String::new(),
            "deployments" => "NAME   READY   UP-TO-DATE\napi    1/1     1\n".to_string(),
            other => format!("NAME\n{}-1\n", other),
        })
    }

    async fn list_resource_types(&self, _scope: &Scope) -> Result<Vec<String>, KubectlError> {
        self.fetch()?;
        Ok(vec![
            "pods".to_string(),
            "deployments.apps".to_string(),
            "services".to_string(),
        ])
    }

    async fn describe(
        &self,
        _scope: &Scope,
        resource_type: &str,
        name: &str,
    ) -> Result<String, KubectlError> {
        self.mutate(format!("describe {} {}", resource_type, name))?;
        Ok(format!("Name: {}\nKind: {}\n", name, resource_type))
    }

    async fn exec(
        &self,
        _scope: &Scope,
        pod: &str,
        container: Option<&str>,
    ) -> Result<(), KubectlError> {
        self.mutate(format!("exec {} {}", pod, container.unwrap_or("-")))
    }

    async fn logs(&self, _scope: &Scope, request: &LogsRequest) -> Result<String, KubectlError> {
        self.mutate(format!("logs {}", request.pod))?;
        Ok(format!("log line from {}\n", request.pod))
    }

    async fn follow_logs(&self, _scope: &Scope, request: &LogsRequest) -> Result<(), KubectlError> {
        self.mutate(format!("follow {}", request.pod))
    }

    async fn delete(
        &self,
        _scope: &Scope,
        resource_type: &str,
        name: &str,
        force: bool,
    ) -> Result<String, KubectlError> {
        let suffix = if force { " --force" } else { "" };
        self.mutate(format!("delete {} {}{}", resource_type, name, suffix))?;
        Ok(format!("{} \"{}\" deleted", resource_type, name))
    }

    async fn scale(
        &self,
        _scope: &Scope,
        resource_type: &str,
        name: &str,
        replicas: u32,
    ) -> Result<String, KubectlError> {
        self.mutate(format!("scale {} {} {}", resource_type, name, replicas))?;
        Ok(format!("{}/{} scaled", resource_type, name))
    }

    async fn edit(&self, _scope: &Scope, resource_type: &str, name: &str) -> Result<(), KubectlError> {
        self.mutate(format!("edit {} {}", resource_type, name))
    }

    async fn switch_context(&self, name: &str) -> Result<(), KubectlError> {
        if !["dev", "prod"].contains(&name) {
            return Err(KubectlError::ContextNotFound(name.to_string()));
        }
        self.mutate(format!("use-context {}", name))?;
        if let Ok(mut current) = self.current.lock() {
            *current = name.to_string();
        }
        Ok(())
    }

    async fn list_contexts(&self) -> Result<Vec<String>, KubectlError> {
        self.fetch()?;
        Ok(vec!["dev".to_string(), "prod".to_string()])
    }

    async fn current_context(&self) -> Result<String, KubectlError> {
        Ok(self.current())
    }

    async fn current_namespace(&self, context: &str) -> Result<String, KubectlError> {
        Ok(match context {
            "dev" => "sandbox".to_string(),
            _ => "default".to_string(),
        })
    }
}
