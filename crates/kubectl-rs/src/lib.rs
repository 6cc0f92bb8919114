//! kubectl-rs: async kubectl adapter for kube-pilot
//!
//! Exposes the [`ClusterClient`] capability kube-pilot's engine depends on,
//! a [`Kubectl`] implementation that shells out to `kubectl`, kubeconfig
//! parsing, and the pod listing types produced by `kubectl get pods -o json`.
//!
//! # Example
//!
//! ```no_run
//! use kubectl_rs::{ClusterClient, Kubectl, Scope};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let kubectl = Kubectl::new();
//!     let context = kubectl.current_context().await?;
//!     let namespace = kubectl.current_namespace(&context).await?;
//!
//!     let pods = kubectl.list_pods(&Scope::new(context, namespace)).await?;
//!     for pod in &pods.items {
//!         println!("{}", pod.name());
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod kubeconfig;
pub mod kubectl;
pub mod types;

pub use client::{ClusterClient, LogsRequest, Scope};
pub use error::KubectlError;
pub use kubeconfig::{DEFAULT_NAMESPACE, KubeConfig};
pub use kubectl::Kubectl;
pub use types::{
    Container, ContainerState, ContainerStatus, ObjectMeta, Pod, PodList, PodSpec, PodStatus,
    StateRunning, StateTerminated, StateWaiting,
};
