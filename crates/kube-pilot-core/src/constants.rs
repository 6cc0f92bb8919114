//! Shared constants for status classification and caching

/// Status fragments that color a whole row as an alert
pub const ALERT_TOKENS: &[&str] = &["Error", "Failed", "CrashLoopBackOff", "OOMKilled"];

/// Status fragments that dim a whole row (finished workloads)
pub const DIM_TOKENS: &[&str] = &["Completed", "Terminated", "Succeeded"];

/// Pod status fragments that color a whole row as pending
pub const PENDING_TOKENS: &[&str] = &["Pending", "ContainerCreating"];

/// Container states shown as "still starting"
pub const STARTING_STATES: &[&str] = &["Waiting", "Pending", "ContainerCreating", "PodInitializing"];

/// Init container waiting reason that means "not started yet"
pub const POD_INITIALIZING: &str = "PodInitializing";

/// Terminal reason of an init container that finished successfully
pub const COMPLETED: &str = "Completed";

/// Resource types (and their short names) that accept `kubectl scale`
pub const SCALABLE_TYPES: &[&str] = &[
    "deployments",
    "deployment",
    "deploy",
    "statefulsets",
    "statefulset",
    "sts",
    "replicasets",
    "replicaset",
    "rs",
    "replicationcontrollers",
    "replicationcontroller",
    "rc",
];

/// Names kubectl accepts for pods
pub const POD_TYPES: &[&str] = &["pods", "pod", "po"];

/// Resource type used for actions on the pods and containers views
pub const POD_RESOURCE: &str = "pod";

/// Trailing log lines fetched by the logs action
pub const LOG_TAIL_LINES: u32 = 1000;

/// Default seconds between background refreshes
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

/// Directory name under the system temp dir used when no cache dir is configured
pub const DEFAULT_CACHE_DIR_NAME: &str = "kube-pilot";

/// Marker that starts the metadata line of every cache file
pub const CACHE_HEADER_PREFIX: &str = "#kube-pilot";
