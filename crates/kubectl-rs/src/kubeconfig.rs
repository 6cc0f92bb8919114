//! Kubeconfig parsing
//!
//! Reads the subset of the kubeconfig format kube-pilot needs: the ordered
//! context list, the current context, and each context's namespace.

use crate::error::KubectlError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Namespace used when a context does not pin one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Kubernetes client configuration (matches the kubeconfig format)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KubeConfig {
    /// Current context name
    #[serde(rename = "current-context", default)]
    pub current_context: String,
    /// Available contexts, in file order
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
}

/// A named entry of the `contexts` list
#[derive(Debug, Clone, Deserialize)]
pub struct NamedContext {
    pub name: String,
    #[serde(default)]
    pub context: ContextSpec,
}

/// The body of a context entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContextSpec {
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub user: String,
    /// Namespace pinned by the context (optional)
    #[serde(default)]
    pub namespace: Option<String>,
}

impl KubeConfig {
    /// Load configuration from `$KUBECONFIG` (first entry) or `~/.kube/config`
    pub fn load_default() -> Result<Self, KubectlError> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, KubectlError> {
        if !path.exists() {
            return Err(KubectlError::KubeconfigNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse kubeconfig YAML
    pub fn parse(content: &str) -> Result<Self, KubectlError> {
        // kubectl accepts an empty file as "no configuration"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Resolve the kubeconfig path the way kubectl does for the common case
    pub fn default_path() -> Result<PathBuf, KubectlError> {
        if let Ok(value) = std::env::var("KUBECONFIG")
            && let Some(first) = std::env::split_paths(&value).find(|p| !p.as_os_str().is_empty())
        {
            return Ok(first);
        }
        let home = dirs_next::home_dir().ok_or(KubectlError::NoHomeDirectory)?;
        Ok(home.join(".kube").join("config"))
    }

    /// Context names in declaration order
    pub fn context_names(&self) -> Vec<String> {
        self.contexts.iter().map(|c| c.name.clone()).collect()
    }

    /// Get a specific context by name
    pub fn get_context(&self, name: &str) -> Result<&ContextSpec, KubectlError> {
        self.contexts
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.context)
            .ok_or_else(|| KubectlError::ContextNotFound(name.to_string()))
    }

    /// Namespace of a context, falling back to `default`
    pub fn namespace_for(&self, name: &str) -> String {
        self.get_context(name)
            .ok()
            .and_then(|c| c.namespace.clone())
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
    }
}
