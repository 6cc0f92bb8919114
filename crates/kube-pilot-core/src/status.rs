//! Pod and container status resolution
//!
//! Turns a raw [`PodList`] into the rows of the pods and containers tables:
//! kubectl-style status labels, readiness counts, restart totals, ages, and
//! semantic color tags. Everything here is pure; the only time dependency is
//! the explicit `now` used for ages.

use crate::constants::{COMPLETED, POD_INITIALIZING, STARTING_STATES};
use crate::formatting::format_age;
use crate::indicators::{ColorTag, RowStyle, is_alert, is_dim, row_override};
use chrono::{DateTime, Utc};
use kubectl_rs::{Container, ContainerState, ContainerStatus, Pod, PodList};
use std::collections::HashMap;

/// One row of the pods table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodSummary {
    pub name: String,
    pub ready_count: usize,
    pub total_count: usize,
    pub status: String,
    pub restarts: u32,
    pub age: String,
    /// Summary tag for the whole row
    pub color: ColorTag,
    /// Per-column coloring (NAME, READY, STATUS, RESTARTS, AGE)
    pub style: RowStyle,
}

/// Whether a container row comes from `initContainers` or `containers`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Init,
    Regular,
}

/// One row of the containers table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub pod_name: String,
    pub container_name: String,
    pub kind: ContainerKind,
    pub ready: bool,
    pub state: String,
    pub image: String,
    pub color: ColorTag,
    /// Per-column coloring (POD, NAME, READY, STATUS, IMAGE)
    pub style: RowStyle,
}

/// Rows derived from one snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    pub pods: Vec<PodSummary>,
    pub containers: Vec<ContainerSummary>,
}

/// Resolve every pod of a listing, preserving listing order
pub fn resolve(list: &PodList, now: DateTime<Utc>) -> Resolved {
    let mut resolved = Resolved::default();
    for pod in &list.items {
        resolved.pods.push(summarize_pod(pod, now));
        resolved.containers.extend(container_rows(pod));
    }
    resolved
}

/// Build the pods-table row for one pod
pub fn summarize_pod(pod: &Pod, now: DateTime<Utc>) -> PodSummary {
    let (ready_count, total_count) = readiness(pod);
    let status = pod_status(pod, ready_count, total_count);
    let restarts = restart_count(pod);
    let age = format_age(pod.metadata.creation_timestamp.as_deref(), now);

    let fully_ready = total_count > 0 && ready_count == total_count;
    let (color, style) = match row_override(&status) {
        Some(tag) => (tag, RowStyle::Uniform(tag)),
        None => {
            let ready_tag = if fully_ready {
                ColorTag::Ok
            } else {
                ColorTag::Warn
            };
            let status_tag = match status.as_str() {
                "Running" if fully_ready => ColorTag::Ok,
                "Running" | "NotReady" => ColorTag::Warn,
                _ => ColorTag::Plain,
            };
            let restart_tag = if restarts > 0 {
                ColorTag::Warn
            } else {
                ColorTag::Plain
            };
            (
                status_tag,
                RowStyle::Columns(vec![
                    ColorTag::Plain,
                    ready_tag,
                    status_tag,
                    restart_tag,
                    ColorTag::Plain,
                ]),
            )
        }
    };

    PodSummary {
        name: pod.name().to_string(),
        ready_count,
        total_count,
        status,
        restarts,
        age,
        color,
        style,
    }
}

/// (ready, total) container counts
///
/// Completed init containers count as ready. Statuses are joined to the
/// declared containers by name, so `ready <= total` always holds.
pub fn readiness(pod: &Pod) -> (usize, usize) {
    let init_status = by_name(&pod.status.init_container_statuses);
    let status = by_name(&pod.status.container_statuses);

    let init_ready = pod
        .spec
        .init_containers
        .iter()
        .filter(|c| {
            init_status
                .get(c.name.as_str())
                .is_some_and(|s| terminated_reason(&s.state) == Some(COMPLETED))
        })
        .count();
    let ready = pod
        .spec
        .containers
        .iter()
        .filter(|c| status.get(c.name.as_str()).is_some_and(|s| s.ready))
        .count();

    (
        init_ready + ready,
        pod.spec.init_containers.len() + pod.spec.containers.len(),
    )
}

/// Total restarts across init and regular container statuses
pub fn restart_count(pod: &Pod) -> u32 {
    pod.status
        .init_container_statuses
        .iter()
        .chain(&pod.status.container_statuses)
        .map(|s| s.restart_count)
        .sum()
}

/// kubectl-style status label (first match wins)
pub fn pod_status(pod: &Pod, ready_count: usize, total_count: usize) -> String {
    if pod.metadata.deletion_timestamp.is_some() {
        return "Terminating".to_string();
    }

    if let Some(label) = init_status(pod) {
        return label;
    }

    let statuses = in_declared_order(&pod.spec.containers, &pod.status.container_statuses);
    for status in statuses {
        if let Some(waiting) = &status.state.waiting {
            if let Some(reason) = waiting.reason.as_deref().filter(|r| !r.is_empty()) {
                return reason.to_string();
            }
        } else if let Some(terminated) = &status.state.terminated {
            // A missing exit code is treated as a failure
            if terminated.exit_code.unwrap_or(1) != 0 {
                return terminated
                    .reason
                    .clone()
                    .unwrap_or_else(|| "Error".to_string());
            }
        }
    }

    match pod.status.phase.as_deref() {
        Some("Running") if ready_count == total_count => "Running".to_string(),
        Some("Running") => "NotReady".to_string(),
        Some("Succeeded") => "Completed".to_string(),
        Some("Failed") => "Error".to_string(),
        Some(phase) if !phase.is_empty() => phase.to_string(),
        _ => "Unknown".to_string(),
    }
}

/// Status contributed by init containers, if they are not all done
fn init_status(pod: &Pod) -> Option<String> {
    let statuses = in_declared_order(
        &pod.spec.init_containers,
        &pod.status.init_container_statuses,
    );
    let total = if pod.spec.init_containers.is_empty() {
        statuses.len()
    } else {
        pod.spec.init_containers.len()
    };

    let mut completed = 0;
    for status in statuses {
        if let Some(waiting) = &status.state.waiting {
            let reason = waiting
                .reason
                .as_deref()
                .filter(|r| !r.is_empty())
                .unwrap_or(POD_INITIALIZING);
            return Some(if reason == POD_INITIALIZING {
                format!("Init:{}/{}", completed, total)
            } else {
                format!("Init:{}", reason)
            });
        }
        if let Some(terminated) = &status.state.terminated {
            let reason = terminated.reason.as_deref().unwrap_or("Error");
            if reason != COMPLETED {
                return Some(format!("Init:{}", reason));
            }
            completed += 1;
        }
    }
    None
}

/// Container rows: init containers first, then regular ones, in declared order
///
/// Declared containers without a status entry are omitted.
pub fn container_rows(pod: &Pod) -> Vec<ContainerSummary> {
    let mut rows = Vec::new();
    let init_status = by_name(&pod.status.init_container_statuses);
    for container in &pod.spec.init_containers {
        if let Some(status) = init_status.get(container.name.as_str()) {
            let completed = terminated_reason(&status.state) == Some(COMPLETED);
            rows.push(container_row(
                pod,
                container,
                status,
                ContainerKind::Init,
                status.ready || completed,
            ));
        }
    }

    let status = by_name(&pod.status.container_statuses);
    for container in &pod.spec.containers {
        if let Some(status) = status.get(container.name.as_str()) {
            rows.push(container_row(
                pod,
                container,
                status,
                ContainerKind::Regular,
                status.ready,
            ));
        }
    }
    rows
}

fn container_row(
    pod: &Pod,
    container: &Container,
    status: &ContainerStatus,
    kind: ContainerKind,
    ready: bool,
) -> ContainerSummary {
    let state = state_label(&status.state);
    let (color, style) = container_style(&state, ready);
    ContainerSummary {
        pod_name: pod.name().to_string(),
        container_name: container.name.clone(),
        kind,
        ready,
        state,
        image: container.image.clone(),
        color,
        style,
    }
}

fn container_style(state: &str, ready: bool) -> (ColorTag, RowStyle) {
    if is_alert(state) {
        return (ColorTag::Alert, RowStyle::Uniform(ColorTag::Alert));
    }
    if is_dim(state) {
        return (ColorTag::Dim, RowStyle::Uniform(ColorTag::Dim));
    }

    let (ready_tag, state_tag) = if state == "Running" {
        if ready {
            (ColorTag::Ok, ColorTag::Ok)
        } else {
            (ColorTag::Alert, ColorTag::Warn)
        }
    } else if STARTING_STATES.contains(&state) {
        (ColorTag::Warn, ColorTag::Warn)
    } else {
        return (ColorTag::Plain, RowStyle::Uniform(ColorTag::Plain));
    };

    (
        state_tag,
        RowStyle::Columns(vec![
            ColorTag::Plain,
            ColorTag::Plain,
            ready_tag,
            state_tag,
            ColorTag::Dim,
        ]),
    )
}

/// Human label of a container state
pub fn state_label(state: &ContainerState) -> String {
    if state.running.is_some() {
        "Running".to_string()
    } else if let Some(waiting) = &state.waiting {
        waiting
            .reason
            .clone()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "Waiting".to_string())
    } else if let Some(terminated) = &state.terminated {
        terminated
            .reason
            .clone()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "Terminated".to_string())
    } else {
        "Unknown".to_string()
    }
}

fn terminated_reason(state: &ContainerState) -> Option<&str> {
    state.terminated.as_ref().and_then(|t| t.reason.as_deref())
}

fn by_name(statuses: &[ContainerStatus]) -> HashMap<&str, &ContainerStatus> {
    statuses.iter().map(|s| (s.name.as_str(), s)).collect()
}

/// Statuses ordered by the spec's declaration order; undeclared statuses
/// follow in their reported order
fn in_declared_order<'a>(
    declared: &[Container],
    statuses: &'a [ContainerStatus],
) -> Vec<&'a ContainerStatus> {
    let lookup = by_name(statuses);
    let mut ordered: Vec<&ContainerStatus> = declared
        .iter()
        .filter_map(|c| lookup.get(c.name.as_str()).copied())
        .collect();
    ordered.extend(
        statuses
            .iter()
            .filter(|s| !declared.iter().any(|c| c.name == s.name)),
    );
    ordered
}
