//! Persisted navigation state
//!
//! Each front-end key press is handled by a fresh process, so the state lives
//! on disk as one JSON record per session and is loaded, transitioned, and
//! saved around every action.

use crate::atomic::write_atomic;
use crate::errors::PilotError;
use crate::navigation::Mode;
use kubectl_rs::Scope;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Opaque address of the front-end's reload endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListenerHandle(String);

impl ListenerHandle {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn address(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the user is and what they are looking at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    pub session: String,
    pub mode: Mode,
    #[serde(default)]
    pub selected_pod: Option<String>,
    #[serde(default)]
    pub selected_resource_type: Option<String>,
    #[serde(default)]
    pub selected_object: Option<String>,
    pub context: String,
    pub namespace: String,
    /// Derived from (cache dir, context, namespace)
    pub cache_root: PathBuf,
    #[serde(default)]
    pub listener: Option<ListenerHandle>,
}

impl NavigationState {
    /// Fresh state of a new session, browsing pods
    pub fn new(
        session: impl Into<String>,
        context: impl Into<String>,
        namespace: impl Into<String>,
        cache_dir: &Path,
    ) -> Self {
        let context = context.into();
        let namespace = namespace.into();
        Self {
            session: session.into(),
            mode: Mode::Pods,
            selected_pod: None,
            selected_resource_type: None,
            selected_object: None,
            cache_root: cache_root_for(cache_dir, &context, &namespace),
            context,
            namespace,
            listener: None,
        }
    }

    pub fn scope(&self) -> Scope {
        Scope::new(&self.context, &self.namespace)
    }

    /// Point the session at another context/namespace
    pub fn set_scope(&mut self, context: &str, namespace: &str, cache_dir: &Path) {
        self.context = context.to_string();
        self.namespace = namespace.to_string();
        self.cache_root = cache_root_for(cache_dir, context, namespace);
    }

    /// Enter a mode, remembering the selection it implies
    pub fn enter(&mut self, mode: Mode) {
        match &mode {
            Mode::Containers(pod) => self.selected_pod = Some(pod.clone()),
            Mode::Objects(resource_type) => {
                self.selected_resource_type = Some(resource_type.clone())
            }
            Mode::Pods | Mode::Contexts | Mode::Resources => {}
        }
        self.mode = mode;
    }
}

/// Cache directory of one (context, namespace) pair
///
/// Each name is percent-encoded into a single directory level, so distinct
/// names never share a directory.
pub fn cache_root_for(cache_dir: &Path, context: &str, namespace: &str) -> PathBuf {
    cache_dir
        .join(sanitize_component(context))
        .join(sanitize_component(namespace))
}

/// Encode a string as one path component, one-to-one
///
/// Everything but ASCII alphanumerics and `-_.~` is percent-encoded. Names
/// that would still be empty, `.` or `..` get a bare `%` prefix, which the
/// encoding itself never emits.
pub fn sanitize_component(raw: &str) -> String {
    let encoded = urlencoding::encode(raw);
    if encoded.chars().all(|c| c == '.') {
        format!("%{}", encoded)
    } else {
        encoded.into_owned()
    }
}

/// JSON session records under `<cache-dir>/sessions`
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, session: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", sanitize_component(session)))
    }

    pub fn save(&self, state: &NavigationState) -> Result<(), PilotError> {
        let json = serde_json::to_vec_pretty(state)?;
        write_atomic(&self.path(&state.session), &json)?;
        Ok(())
    }

    pub fn load(&self, session: &str) -> Result<NavigationState, PilotError> {
        let path = self.path(session);
        let content = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                PilotError::Session(format!("no session '{}' (is kube-pilot running?)", session))
            }
            _ => PilotError::Io(e),
        })?;
        Ok(serde_json::from_slice(&content)?)
    }

    /// Remove a session record; a missing record is not an error
    pub fn remove(&self, session: &str) -> Result<(), PilotError> {
        match std::fs::remove_file(self.path(session)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
