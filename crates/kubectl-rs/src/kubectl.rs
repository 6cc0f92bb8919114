//! kubectl command execution
//!
//! Implements [`ClusterClient`] by running `kubectl`. Listing calls capture
//! stdout; interactive calls inherit the terminal and wait for the child.

use crate::client::{ClusterClient, LogsRequest, Scope};
use crate::error::KubectlError;
use crate::kubeconfig::KubeConfig;
use crate::types::PodList;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

const KUBECTL: &str = "kubectl";

/// Shell used for `exec`; falls back to sh when bash is missing
const EXEC_SHELL: &str = "command -v bash >/dev/null 2>&1 && exec bash || exec sh";

/// kubectl-backed cluster client
#[derive(Debug, Clone, Default)]
pub struct Kubectl {
    /// Explicit kubeconfig path (None = kubectl's default resolution)
    kubeconfig: Option<PathBuf>,
}

impl Kubectl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific kubeconfig for both kubectl and context lookups
    pub fn with_kubeconfig(path: impl Into<PathBuf>) -> Self {
        Self {
            kubeconfig: Some(path.into()),
        }
    }

    fn load_kubeconfig(&self) -> Result<KubeConfig, KubectlError> {
        match &self.kubeconfig {
            Some(path) => KubeConfig::load_from(path),
            None => KubeConfig::load_default(),
        }
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(KUBECTL);
        if let Some(path) = &self.kubeconfig {
            cmd.arg("--kubeconfig").arg(path);
        }
        cmd.args(args);
        cmd
    }

    /// Execute kubectl and return stdout
    async fn exec_kubectl(&self, args: Vec<String>) -> Result<String, KubectlError> {
        tracing::debug!("kubectl {}", args.join(" "));
        let output = self
            .command(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(spawn_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KubectlError::CommandFailed {
                command: describe_command(&args),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Execute kubectl attached to the current terminal
    async fn exec_kubectl_interactive(&self, args: Vec<String>) -> Result<(), KubectlError> {
        tracing::debug!("kubectl (interactive) {}", args.join(" "));
        let status = self
            .command(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(spawn_error)?;

        if status.success() {
            Ok(())
        } else {
            Err(KubectlError::Interrupted {
                command: describe_command(&args),
                code: status.code().unwrap_or(-1),
            })
        }
    }
}

fn spawn_error(e: std::io::Error) -> KubectlError {
    if e.kind() == std::io::ErrorKind::NotFound {
        KubectlError::MissingBinary(KUBECTL.to_string())
    } else {
        KubectlError::Io(e)
    }
}

/// Short command label for error messages (`kubectl get pods`)
fn describe_command(args: &[String]) -> String {
    let mut words = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--context" | "--namespace" | "--kubeconfig" => {
                iter.next();
            }
            a if a.starts_with('-') => {}
            a => words.push(a),
        }
        if words.len() == 2 {
            break;
        }
    }
    format!("{} {}", KUBECTL, words.join(" "))
}

/// Build an argument list prefixed with the scope's context and namespace
fn scoped_args(scope: &Scope, args: &[&str]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len() + 4);
    if !scope.context.is_empty() {
        out.push("--context".to_string());
        out.push(scope.context.clone());
    }
    if !scope.namespace.is_empty() {
        out.push("--namespace".to_string());
        out.push(scope.namespace.clone());
    }
    out.extend(args.iter().map(|a| a.to_string()));
    out
}

fn logs_args(scope: &Scope, request: &LogsRequest, follow: bool) -> Vec<String> {
    let mut args = scoped_args(scope, &["logs", &request.pod]);
    if let Some(container) = &request.container {
        args.push("--container".to_string());
        args.push(container.clone());
    }
    if request.previous {
        args.push("--previous".to_string());
    }
    if let Some(tail) = request.tail {
        args.push(format!("--tail={}", tail));
    }
    if follow {
        args.push("--follow".to_string());
    }
    args
}

/// Parse `kubectl api-resources -o name` output
fn parse_resource_names(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

impl ClusterClient for Kubectl {
    async fn list_pods(&self, scope: &Scope) -> Result<PodList, KubectlError> {
        let output = self
            .exec_kubectl(scoped_args(scope, &["get", "pods", "-o", "json"]))
            .await?;
        Ok(PodList::from_json(&output)?)
    }

    async fn get_table(&self, scope: &Scope, resource_type: &str) -> Result<String, KubectlError> {
        self.exec_kubectl(scoped_args(scope, &["get", resource_type]))
            .await
    }

    async fn list_resource_types(&self, scope: &Scope) -> Result<Vec<String>, KubectlError> {
        let output = self
            .exec_kubectl(scoped_args(
                scope,
                &["api-resources", "--verbs=list", "-o", "name"],
            ))
            .await?;
        Ok(parse_resource_names(&output))
    }

    async fn describe(
        &self,
        scope: &Scope,
        resource_type: &str,
        name: &str,
    ) -> Result<String, KubectlError> {
        self.exec_kubectl(scoped_args(scope, &["describe", resource_type, name]))
            .await
    }

    async fn exec(
        &self,
        scope: &Scope,
        pod: &str,
        container: Option<&str>,
    ) -> Result<(), KubectlError> {
        let mut args = scoped_args(scope, &["exec", "-it", pod]);
        if let Some(container) = container {
            args.push("--container".to_string());
            args.push(container.to_string());
        }
        args.extend(["--", "sh", "-c", EXEC_SHELL].map(String::from));
        self.exec_kubectl_interactive(args).await
    }

    async fn logs(&self, scope: &Scope, request: &LogsRequest) -> Result<String, KubectlError> {
        self.exec_kubectl(logs_args(scope, request, false)).await
    }

    async fn follow_logs(&self, scope: &Scope, request: &LogsRequest) -> Result<(), KubectlError> {
        self.exec_kubectl_interactive(logs_args(scope, request, true))
            .await
    }

    async fn delete(
        &self,
        scope: &Scope,
        resource_type: &str,
        name: &str,
        force: bool,
    ) -> Result<String, KubectlError> {
        let mut args = scoped_args(scope, &["delete", resource_type, name, "--wait=false"]);
        if force {
            args.push("--force".to_string());
            args.push("--grace-period=0".to_string());
        }
        self.exec_kubectl(args).await
    }

    async fn scale(
        &self,
        scope: &Scope,
        resource_type: &str,
        name: &str,
        replicas: u32,
    ) -> Result<String, KubectlError> {
        let target = format!("{}/{}", resource_type, name);
        let replicas = format!("--replicas={}", replicas);
        self.exec_kubectl(scoped_args(scope, &["scale", &target, &replicas]))
            .await
    }

    async fn edit(&self, scope: &Scope, resource_type: &str, name: &str) -> Result<(), KubectlError> {
        let target = format!("{}/{}", resource_type, name);
        self.exec_kubectl_interactive(scoped_args(scope, &["edit", &target]))
            .await
    }

    async fn switch_context(&self, name: &str) -> Result<(), KubectlError> {
        // Fail early with a clear message instead of kubectl's generic one
        self.load_kubeconfig()?.get_context(name)?;
        self.exec_kubectl(vec![
            "config".to_string(),
            "use-context".to_string(),
            name.to_string(),
        ])
        .await
        .map(|_| ())
    }

    async fn list_contexts(&self) -> Result<Vec<String>, KubectlError> {
        Ok(self.load_kubeconfig()?.context_names())
    }

    async fn current_context(&self) -> Result<String, KubectlError> {
        Ok(self.load_kubeconfig()?.current_context)
    }

    async fn current_namespace(&self, context: &str) -> Result<String, KubectlError> {
        Ok(self.load_kubeconfig()?.namespace_for(context))
    }
}
