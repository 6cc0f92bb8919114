//! Error types and user-facing error formatting
//!
//! [`PilotError`] is what the engine returns. [`format_kubectl_error`] turns
//! low-level kubectl failures into short, actionable text for placeholders
//! and inline messages.

use kubectl_rs::KubectlError;
use thiserror::Error;

/// Errors returned by the kube-pilot engine
#[derive(Debug, Error)]
pub enum PilotError {
    /// A cluster fetch failed
    #[error("{}", format_kubectl_error(.0))]
    Cluster(#[from] KubectlError),

    /// The user typed something the action cannot use
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An external operation (exec, edit, delete...) failed
    #[error("{operation} failed: {message}")]
    ExternalOperation { operation: String, message: String },

    #[error("Session error: {0}")]
    Session(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PilotError {
    /// Wrap a kubectl failure of a user-triggered operation
    pub fn external(operation: impl Into<String>, error: &KubectlError) -> Self {
        PilotError::ExternalOperation {
            operation: operation.into(),
            message: format_kubectl_error(error),
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, PilotError::InvalidInput(_))
    }
}

/// Format a KubectlError into a user-friendly message
///
/// # Examples
///
/// ```
/// use kube_pilot_core::errors::format_kubectl_error;
/// use kubectl_rs::KubectlError;
///
/// let error = KubectlError::CommandFailed {
///     command: "kubectl get pods".to_string(),
///     stderr: "dial tcp 10.0.0.1:6443: connect: connection refused".to_string(),
/// };
/// assert!(format_kubectl_error(&error).contains("refused"));
/// ```
pub fn format_kubectl_error(error: &KubectlError) -> String {
    match error {
        KubectlError::CommandFailed { stderr, .. } => format_stderr(stderr),
        KubectlError::MissingBinary(binary) => {
            format!("{} not found - install it and make sure it is on PATH", binary)
        }
        KubectlError::Interrupted { command, code } => {
            format!("{} exited with status {}", command, code)
        }
        KubectlError::KubeconfigNotFound(path) => format!("Kubeconfig not found: {}", path),
        KubectlError::Kubeconfig(e) => format!("Invalid kubeconfig: {}", e),
        KubectlError::ContextNotFound(ctx) => {
            format!("Context '{}' not found in kubeconfig", ctx)
        }
        KubectlError::Parse(_) => "Unexpected kubectl output".to_string(),
        _ => error.to_string(),
    }
}

/// Map kubectl stderr to a short message
fn format_stderr(stderr: &str) -> String {
    let lower = stderr.to_lowercase();
    if lower.contains("refused") {
        "Connection refused - is the API server reachable?".to_string()
    } else if lower.contains("timeout") || lower.contains("timed out") {
        "Connection timed out - cluster may be slow or unreachable".to_string()
    } else if lower.contains("no such host") || lower.contains("lookup") {
        "DNS resolution failed - check the cluster server address".to_string()
    } else if lower.contains("certificate") || lower.contains("x509") {
        "TLS/certificate error - check kubeconfig credentials".to_string()
    } else if lower.contains("unauthorized") || lower.contains("must be logged in") {
        "Authentication failed - check kubeconfig credentials".to_string()
    } else if lower.contains("forbidden") {
        "Permission denied - check RBAC for this user".to_string()
    } else if lower.contains("notfound") || lower.contains("not found") {
        "Resource not found".to_string()
    } else {
        let first = stderr.lines().map(str::trim).find(|l| !l.is_empty());
        match first {
            Some(line) => format!("kubectl error: {}", line),
            None => "kubectl failed without output".to_string(),
        }
    }
}

/// Categorize an error for display purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Auth,
    Config,
    Timeout,
    NotFound,
    /// Required tool missing from PATH
    Setup,
    Other,
}

impl ErrorCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Network",
            ErrorCategory::Auth => "Auth",
            ErrorCategory::Config => "Config",
            ErrorCategory::Timeout => "Timeout",
            ErrorCategory::NotFound => "Not Found",
            ErrorCategory::Setup => "Setup",
            ErrorCategory::Other => "Error",
        }
    }
}

/// Categorize a KubectlError
pub fn categorize_error(error: &KubectlError) -> ErrorCategory {
    match error {
        KubectlError::CommandFailed { stderr, .. } => {
            let lower = stderr.to_lowercase();
            if lower.contains("timeout") || lower.contains("timed out") {
                ErrorCategory::Timeout
            } else if lower.contains("unauthorized")
                || lower.contains("forbidden")
                || lower.contains("certificate")
                || lower.contains("x509")
            {
                ErrorCategory::Auth
            } else if lower.contains("not found") || lower.contains("notfound") {
                ErrorCategory::NotFound
            } else if lower.contains("refused")
                || lower.contains("no such host")
                || lower.contains("unreachable")
            {
                ErrorCategory::Network
            } else {
                ErrorCategory::Other
            }
        }
        KubectlError::MissingBinary(_) => ErrorCategory::Setup,
        KubectlError::Kubeconfig(_)
        | KubectlError::KubeconfigNotFound(_)
        | KubectlError::ContextNotFound(_)
        | KubectlError::NoHomeDirectory => ErrorCategory::Config,
        _ => ErrorCategory::Other,
    }
}

/// One-line detail for placeholders: `<category>: <message>`
pub fn failure_detail(error: &KubectlError) -> String {
    format!(
        "{}: {}",
        categorize_error(error).label(),
        format_kubectl_error(error)
    )
}
