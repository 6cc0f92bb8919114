//! Semantic color tags
//!
//! The resolver attaches tags to rows and cells; mapping a tag to terminal
//! styling is left to a [`Palette`](crate::table::Palette).

use crate::constants::{ALERT_TOKENS, DIM_TOKENS, PENDING_TOKENS};
use serde::{Deserialize, Serialize};

/// Semantic color of a row or cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    /// Healthy / fully ready
    Ok,
    /// Degraded, starting, or restarted
    Warn,
    /// Failed or crashing
    Alert,
    /// Finished workloads
    Dim,
    /// Column headers and banners
    Header,
    /// No emphasis
    #[default]
    Plain,
}

impl ColorTag {
    pub fn label(&self) -> &'static str {
        match self {
            ColorTag::Ok => "ok",
            ColorTag::Warn => "warn",
            ColorTag::Alert => "alert",
            ColorTag::Dim => "dim",
            ColorTag::Header => "header",
            ColorTag::Plain => "plain",
        }
    }
}

impl std::fmt::Display for ColorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// How a table row is colored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStyle {
    /// One tag for every column, overriding per-column coloring
    Uniform(ColorTag),
    /// One tag per column, in column order
    Columns(Vec<ColorTag>),
}

impl RowStyle {
    /// Tag for a column (missing columns are plain)
    pub fn tag(&self, column: usize) -> ColorTag {
        match self {
            RowStyle::Uniform(tag) => *tag,
            RowStyle::Columns(tags) => tags.get(column).copied().unwrap_or_default(),
        }
    }
}

/// Whether a status label contains any token of the alert set
pub fn is_alert(status: &str) -> bool {
    contains_any(status, ALERT_TOKENS)
}

/// Whether a status label marks a finished workload
pub fn is_dim(status: &str) -> bool {
    contains_any(status, DIM_TOKENS)
}

/// Whether a pod status label means "still being scheduled or created"
pub fn is_pending(status: &str) -> bool {
    contains_any(status, PENDING_TOKENS)
}

fn contains_any(status: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| status.contains(t))
}

/// Row-wide tag for a status, if the status overrides per-column coloring
///
/// Alerts win over dim, which wins over pending.
pub fn row_override(status: &str) -> Option<ColorTag> {
    if is_alert(status) {
        Some(ColorTag::Alert)
    } else if is_dim(status) {
        Some(ColorTag::Dim)
    } else if is_pending(status) {
        Some(ColorTag::Warn)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_override() {
        assert_eq!(row_override("CrashLoopBackOff"), Some(ColorTag::Alert));
        assert_eq!(row_override("Init:Error"), Some(ColorTag::Alert));
        assert_eq!(row_override("OOMKilled"), Some(ColorTag::Alert));
        assert_eq!(row_override("Completed"), Some(ColorTag::Dim));
        assert_eq!(row_override("Pending"), Some(ColorTag::Warn));
        assert_eq!(row_override("ContainerCreating"), Some(ColorTag::Warn));
        assert_eq!(row_override("Running"), None);
        assert_eq!(row_override("Terminating"), None);
    }

    #[test]
    fn test_row_style_tag() {
        let uniform = RowStyle::Uniform(ColorTag::Alert);
        assert_eq!(uniform.tag(3), ColorTag::Alert);

        let columns = RowStyle::Columns(vec![ColorTag::Plain, ColorTag::Ok]);
        assert_eq!(columns.tag(1), ColorTag::Ok);
        assert_eq!(columns.tag(7), ColorTag::Plain);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&ColorTag::Warn).unwrap(), "\"warn\"");
    }
}
