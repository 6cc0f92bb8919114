//! Cluster client capability
//!
//! The narrow set of cluster operations kube-pilot relies on. [`Kubectl`]
//! implements it by shelling out; tests substitute an in-memory fake.
//!
//! [`Kubectl`]: crate::kubectl::Kubectl

use crate::error::KubectlError;
use crate::types::PodList;
use std::future::Future;

/// The (context, namespace) pair every namespaced call runs against
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    pub context: String,
    pub namespace: String,
}

impl Scope {
    pub fn new(context: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            namespace: namespace.into(),
        }
    }
}

/// Parameters for fetching container logs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogsRequest {
    pub pod: String,
    pub container: Option<String>,
    /// Show logs of the previous container instance
    pub previous: bool,
    /// Number of trailing lines (None = everything)
    pub tail: Option<u32>,
}

/// Operations kube-pilot needs from a cluster
///
/// Interactive operations (`exec`, `edit`, `follow_logs`) hand the terminal
/// to the external process and resolve once it exits.
pub trait ClusterClient: Send + Sync {
    /// List pods in the scope's namespace
    fn list_pods(&self, scope: &Scope)
    -> impl Future<Output = Result<PodList, KubectlError>> + Send;

    /// Plain table listing of an arbitrary resource type
    fn get_table(
        &self,
        scope: &Scope,
        resource_type: &str,
    ) -> impl Future<Output = Result<String, KubectlError>> + Send;

    /// Listable resource type names known to the cluster
    fn list_resource_types(
        &self,
        scope: &Scope,
    ) -> impl Future<Output = Result<Vec<String>, KubectlError>> + Send;

    fn describe(
        &self,
        scope: &Scope,
        resource_type: &str,
        name: &str,
    ) -> impl Future<Output = Result<String, KubectlError>> + Send;

    fn exec(
        &self,
        scope: &Scope,
        pod: &str,
        container: Option<&str>,
    ) -> impl Future<Output = Result<(), KubectlError>> + Send;

    /// Collect logs (non-follow)
    fn logs(
        &self,
        scope: &Scope,
        request: &LogsRequest,
    ) -> impl Future<Output = Result<String, KubectlError>> + Send;

    /// Stream logs to the terminal until interrupted
    fn follow_logs(
        &self,
        scope: &Scope,
        request: &LogsRequest,
    ) -> impl Future<Output = Result<(), KubectlError>> + Send;

    fn delete(
        &self,
        scope: &Scope,
        resource_type: &str,
        name: &str,
        force: bool,
    ) -> impl Future<Output = Result<String, KubectlError>> + Send;

    fn scale(
        &self,
        scope: &Scope,
        resource_type: &str,
        name: &str,
        replicas: u32,
    ) -> impl Future<Output = Result<String, KubectlError>> + Send;

    fn edit(
        &self,
        scope: &Scope,
        resource_type: &str,
        name: &str,
    ) -> impl Future<Output = Result<(), KubectlError>> + Send;

    fn switch_context(&self, name: &str)
    -> impl Future<Output = Result<(), KubectlError>> + Send;

    /// Context names in kubeconfig order
    fn list_contexts(&self) -> impl Future<Output = Result<Vec<String>, KubectlError>> + Send;

    fn current_context(&self) -> impl Future<Output = Result<String, KubectlError>> + Send;

    /// Namespace pinned by a context (`default` when unset)
    fn current_namespace(
        &self,
        context: &str,
    ) -> impl Future<Output = Result<String, KubectlError>> + Send;
}
