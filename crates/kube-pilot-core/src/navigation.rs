//! Navigation state machine
//!
//! [`plan`] is the whole transition table: given the current [`Mode`] and a
//! user [`Action`] it returns the [`Step`] the dispatcher should carry out.
//! Pairs that make no sense for the current mode plan to [`Step::Ignore`].

use crate::constants::{POD_RESOURCE, POD_TYPES, SCALABLE_TYPES};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the user is currently browsing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "target", rename_all = "kebab-case")]
pub enum Mode {
    Contexts,
    Resources,
    /// Objects of one resource type
    Objects(String),
    #[default]
    Pods,
    /// Containers of one pod
    Containers(String),
}

impl Mode {
    /// Short title used in the display header
    pub fn title(&self) -> String {
        match self {
            Mode::Contexts => "contexts".to_string(),
            Mode::Resources => "resource types".to_string(),
            Mode::Objects(resource_type) => resource_type.clone(),
            Mode::Pods => "pods".to_string(),
            Mode::Containers(pod) => format!("containers of {}", pod),
        }
    }

    /// Resource type that object actions (describe, delete, edit) apply to
    pub fn resource_type(&self) -> Option<&str> {
        match self {
            Mode::Pods | Mode::Containers(_) => Some(POD_RESOURCE),
            Mode::Objects(resource_type) => Some(resource_type),
            Mode::Contexts | Mode::Resources => None,
        }
    }

    /// Whether exec and logs make sense here
    pub fn targets_pods(&self) -> bool {
        match self {
            Mode::Pods | Mode::Containers(_) => true,
            Mode::Objects(resource_type) => POD_TYPES.contains(&base_type(resource_type)),
            Mode::Contexts | Mode::Resources => false,
        }
    }

    pub fn is_scalable(&self) -> bool {
        matches!(self, Mode::Objects(t) if SCALABLE_TYPES.contains(&base_type(t)))
    }
}

/// Resource name without its API group (`deployments.apps` -> `deployments`)
pub fn base_type(resource_type: &str) -> &str {
    resource_type
        .split_once('.')
        .map_or(resource_type, |(name, _)| name)
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// A user action as forwarded by the front-end
///
/// `target` is the first column of the selected row. In the containers view
/// the container name travels separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Enter(String),
    Back,
    SwitchContexts,
    BrowseResources,
    Describe(String),
    Exec {
        target: String,
        container: Option<String>,
    },
    Logs {
        target: String,
        container: Option<String>,
        follow: bool,
        previous: bool,
    },
    Delete {
        target: String,
        /// Raw confirmation answer
        confirmation: String,
        force: bool,
    },
    Scale {
        target: String,
        /// Raw replica count as typed
        replicas: String,
    },
    EditYaml(String),
    Refresh,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Enter(_) => "enter",
            Action::Back => "back",
            Action::SwitchContexts => "switch-contexts",
            Action::BrowseResources => "browse-resources",
            Action::Describe(_) => "describe",
            Action::Exec { .. } => "exec",
            Action::Logs { .. } => "logs",
            Action::Delete { .. } => "delete",
            Action::Scale { .. } => "scale",
            Action::EditYaml(_) => "edit-yaml",
            Action::Refresh => "refresh",
        }
    }
}

/// The planned effect of an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Not applicable in the current mode
    Ignore,
    /// Pure mode change
    Move(Mode),
    /// Switch the active context, then browse its pods
    SwitchContext(String),
    /// Browse objects of a resource type (forces a refresh)
    OpenResourceType(String),
    Describe {
        resource_type: String,
        name: String,
    },
    Exec {
        pod: String,
        container: Option<String>,
    },
    Logs {
        pod: String,
        container: Option<String>,
        follow: bool,
        previous: bool,
    },
    Delete {
        resource_type: String,
        name: String,
        confirmation: String,
        force: bool,
    },
    Scale {
        resource_type: String,
        name: String,
        replicas: String,
    },
    Edit {
        resource_type: String,
        name: String,
    },
    Refresh,
}

/// Plan the step for `action` in `mode`
pub fn plan(mode: &Mode, action: Action) -> Step {
    match action {
        Action::Enter(target) if target.is_empty() => Step::Ignore,
        Action::Enter(target) => match mode {
            Mode::Pods => Step::Move(Mode::Containers(target)),
            Mode::Contexts => Step::SwitchContext(target),
            Mode::Resources => Step::OpenResourceType(target),
            Mode::Objects(_) | Mode::Containers(_) => Step::Ignore,
        },

        Action::Back => match mode {
            Mode::Containers(_) | Mode::Contexts | Mode::Resources => Step::Move(Mode::Pods),
            Mode::Objects(_) => Step::Move(Mode::Resources),
            Mode::Pods => Step::Ignore,
        },

        Action::SwitchContexts => match mode {
            Mode::Pods => Step::Move(Mode::Contexts),
            _ => Step::Ignore,
        },

        Action::BrowseResources => match mode {
            Mode::Pods => Step::Move(Mode::Resources),
            _ => Step::Ignore,
        },

        Action::Describe(target) => match object_target(mode, target) {
            Some((resource_type, name)) => Step::Describe {
                resource_type,
                name,
            },
            None => Step::Ignore,
        },

        Action::Exec { target, container } => match pod_target(mode, target) {
            Some(pod) => Step::Exec {
                pod,
                container: container_in(mode, container),
            },
            None => Step::Ignore,
        },

        Action::Logs {
            target,
            container,
            follow,
            previous,
        } => match pod_target(mode, target) {
            Some(pod) => Step::Logs {
                pod,
                container: container_in(mode, container),
                follow,
                previous,
            },
            None => Step::Ignore,
        },

        Action::Delete {
            target,
            confirmation,
            force,
        } => match object_target(mode, target) {
            Some((resource_type, name)) => Step::Delete {
                resource_type,
                name,
                confirmation,
                force,
            },
            None => Step::Ignore,
        },

        Action::Scale { target, replicas } => match mode {
            Mode::Objects(resource_type) if mode.is_scalable() && !target.is_empty() => {
                Step::Scale {
                    resource_type: resource_type.clone(),
                    name: target,
                    replicas,
                }
            }
            _ => Step::Ignore,
        },

        Action::EditYaml(target) => match object_target(mode, target) {
            Some((resource_type, name)) => Step::Edit {
                resource_type,
                name,
            },
            None => Step::Ignore,
        },

        Action::Refresh => Step::Refresh,
    }
}

/// (resource type, name) for describe/delete/edit
fn object_target(mode: &Mode, target: String) -> Option<(String, String)> {
    if target.is_empty() {
        return None;
    }
    mode.resource_type().map(|t| (t.to_string(), target))
}

fn pod_target(mode: &Mode, target: String) -> Option<String> {
    (!target.is_empty() && mode.targets_pods()).then_some(target)
}

/// Only rows of the containers view name a container
fn container_in(mode: &Mode, container: Option<String>) -> Option<String> {
    match mode {
        Mode::Containers(_) => container.filter(|c| !c.is_empty()),
        _ => None,
    }
}
