//! Error type for kubectl and kubeconfig operations

use thiserror::Error;

/// Errors returned by the kubectl adapter
#[derive(Debug, Error)]
pub enum KubectlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} not found on PATH")]
    MissingBinary(String),

    #[error("{command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("{command} exited with status {code}")]
    Interrupted { command: String, code: i32 },

    #[error("Failed to parse kubectl output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to parse kubeconfig: {0}")]
    Kubeconfig(#[from] serde_yaml::Error),

    #[error("Kubeconfig not found: {0}")]
    KubeconfigNotFound(String),

    #[error("Context '{0}' not found in kubeconfig")]
    ContextNotFound(String),

    #[error("Could not determine home directory")]
    NoHomeDirectory,
}
