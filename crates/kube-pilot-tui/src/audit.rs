//! Audit log of cluster mutations
//!
//! Deletes, scales, edits and context switches are appended to
//! `~/.kube-pilot/audit.log`, one line per attempt.

use chrono::{DateTime, Local};
use kube_pilot_core::{Action, Mode, Outcome, PilotError};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Result of an audited operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditResult {
    Success,
    Failure,
    Cancelled,
}

impl AuditResult {
    fn as_str(&self) -> &'static str {
        match self {
            AuditResult::Success => "SUCCESS",
            AuditResult::Failure => "FAILURE",
            AuditResult::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for AuditResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub timestamp: DateTime<Local>,
    pub user: String,
    /// `context/namespace`
    pub scope: String,
    pub operation: String,
    pub target: String,
    pub result: AuditResult,
    pub details: String,
}

impl AuditEntry {
    fn line(&self) -> String {
        // Format: [timestamp] [scope] [user] [operation] [target] [result] details
        format!(
            "[{}] [{}] [{}] [{}] [{}] [{}] {}\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.scope,
            self.user,
            self.operation,
            self.target,
            self.result,
            self.details
        )
    }
}

pub struct AuditLogger {
    log_path: PathBuf,
    user: String,
    enabled: bool,
}

impl AuditLogger {
    /// Logger writing to `~/.kube-pilot/audit.log`
    pub fn new() -> Self {
        let home = dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::at(home.join(".kube-pilot").join("audit.log"))
    }

    pub fn at(log_path: impl Into<PathBuf>) -> Self {
        let log_path = log_path.into();
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string());
        let enabled = log_path
            .parent()
            .map(|dir| fs::create_dir_all(dir).is_ok())
            .unwrap_or(true);
        Self {
            log_path,
            user,
            enabled,
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Record the result of a mutating action; other actions are skipped
    pub fn record(&self, scope: &str, action: &Action, result: &Result<Outcome, PilotError>) {
        let Some((operation, target)) = audited(action, result) else {
            return;
        };
        let (result, details) = match result {
            Ok(Outcome::Ignored) => return,
            Ok(Outcome::Aborted(msg)) => (AuditResult::Cancelled, msg.clone()),
            Ok(Outcome::Done(msg)) | Ok(Outcome::Output(msg)) => {
                (AuditResult::Success, msg.clone())
            }
            Ok(Outcome::Moved(mode)) => (AuditResult::Success, format!("now browsing {}", mode)),
            Err(e) if e.is_invalid_input() => return,
            Err(e) => (AuditResult::Failure, e.to_string()),
        };
        self.write(AuditEntry {
            timestamp: Local::now(),
            user: self.user.clone(),
            scope: scope.to_string(),
            operation: operation.to_string(),
            target,
            result,
            details,
        });
    }

    fn write(&self, entry: AuditEntry) {
        if !self.enabled {
            return;
        }
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .and_then(|mut file| file.write_all(entry.line().as_bytes()));
        if let Err(e) = written {
            tracing::warn!("Failed to write audit log: {}", e);
        }
    }

    /// Last `count` lines of the log, oldest first
    pub fn read_recent(&self, count: usize) -> Vec<String> {
        match fs::read_to_string(&self.log_path) {
            Ok(content) => {
                let lines: Vec<&str> = content.lines().collect();
                let start = lines.len().saturating_sub(count);
                lines[start..].iter().map(|s| s.to_string()).collect()
            }
            Err(_) => Vec::new(),
        }
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// (operation, target) of actions that change the cluster
///
/// `enter` only changes anything when it switches the context, which is the
/// one case that lands back on the pods view or fails externally.
fn audited(
    action: &Action,
    result: &Result<Outcome, PilotError>,
) -> Option<(&'static str, String)> {
    match action {
        Action::Delete { target, force, .. } => {
            Some((if *force { "force-delete" } else { "delete" }, target.clone()))
        }
        Action::Scale { target, replicas } => {
            Some(("scale", format!("{} -> {}", target, replicas.trim())))
        }
        Action::EditYaml(target) => Some(("edit", target.clone())),
        Action::Enter(target) => match result {
            Ok(Outcome::Moved(Mode::Pods)) | Err(PilotError::ExternalOperation { .. }) => {
                Some(("switch-context", target.clone()))
            }
            _ => None,
        },
        _ => None,
    }
}
