//! Pod listing types
//!
//! Mirrors the parts of `kubectl get pods -o json` that status resolution
//! reads. Every field is optional so partially populated objects (pending
//! pods, pods without a status yet) still deserialize.

use serde::{Deserialize, Serialize};

/// A point-in-time pod listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodList {
    #[serde(default)]
    pub items: Vec<Pod>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PodSpec,
    #[serde(default)]
    pub status: PodStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    /// RFC 3339 timestamp, kept raw so a malformed value does not reject the listing
    #[serde(default)]
    pub creation_timestamp: Option<String>,
    #[serde(default)]
    pub deletion_timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    #[serde(default)]
    pub init_containers: Vec<Container>,
    #[serde(default)]
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodStatus {
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub init_container_statuses: Vec<ContainerStatus>,
    #[serde(default)]
    pub container_statuses: Vec<ContainerStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStatus {
    pub name: String,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub restart_count: u32,
    #[serde(default)]
    pub state: ContainerState,
}

/// Observed container state; at most one branch is set in practice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerState {
    #[serde(default)]
    pub running: Option<StateRunning>,
    #[serde(default)]
    pub waiting: Option<StateWaiting>,
    #[serde(default)]
    pub terminated: Option<StateTerminated>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRunning {
    #[serde(default)]
    pub started_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateWaiting {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateTerminated {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i32>,
}

impl Pod {
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or("unknown")
    }
}

impl PodList {
    /// Parse `kubectl get pods -o json` output
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pod_list() {
        let json = r#"{
            "apiVersion": "v1",
            "kind": "List",
            "items": [{
                "metadata": {"name": "web-1", "creationTimestamp": "2024-01-01T00:00:00Z"},
                "spec": {"containers": [{"name": "app", "image": "nginx:1.25"}]},
                "status": {
                    "phase": "Running",
                    "containerStatuses": [{
                        "name": "app", "ready": true, "restartCount": 2,
                        "state": {"running": {"startedAt": "2024-01-01T00:00:05Z"}}
                    }]
                }
            }]
        }"#;
        let list = PodList::from_json(json).unwrap();
        assert_eq!(list.items.len(), 1);
        let pod = &list.items[0];
        assert_eq!(pod.name(), "web-1");
        assert_eq!(pod.spec.containers[0].image, "nginx:1.25");
        assert_eq!(pod.status.container_statuses[0].restart_count, 2);
        assert!(pod.status.container_statuses[0].state.running.is_some());
    }

    #[test]
    fn test_parse_sparse_pod() {
        let list = PodList::from_json(r#"{"items": [{"metadata": {}}]}"#).unwrap();
        assert_eq!(list.items[0].name(), "unknown");
        assert!(list.items[0].status.phase.is_none());
    }

    #[test]
    fn test_parse_empty_list() {
        let list = PodList::from_json(r#"{"items": []}"#).unwrap();
        assert!(list.items.is_empty());
    }
}
