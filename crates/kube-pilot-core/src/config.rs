//! Engine settings

use crate::constants::{DEFAULT_CACHE_DIR_NAME, DEFAULT_REFRESH_INTERVAL_SECS};
use crate::errors::PilotError;
use std::path::PathBuf;
use std::time::Duration;

/// Options shared by every kube-pilot invocation of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Background refresh period; also the staleness threshold for display
    pub refresh_interval: Duration,
    /// Root of cache entries and session records
    pub cache_dir: PathBuf,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            cache_dir: default_cache_dir(),
            debug: false,
        }
    }
}

impl Settings {
    /// Build settings, rejecting a zero refresh interval
    pub fn new(
        refresh_interval_secs: u64,
        cache_dir: Option<PathBuf>,
        debug: bool,
    ) -> Result<Self, PilotError> {
        if refresh_interval_secs == 0 {
            return Err(PilotError::InvalidInput(
                "refresh interval must be at least 1 second".to_string(),
            ));
        }
        Ok(Self {
            refresh_interval: Duration::from_secs(refresh_interval_secs),
            cache_dir: cache_dir.unwrap_or_else(default_cache_dir),
            debug,
        })
    }

    /// Directory holding session records
    pub fn sessions_dir(&self) -> PathBuf {
        self.cache_dir.join("sessions")
    }
}

/// `<temp>/kube-pilot`
pub fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_CACHE_DIR_NAME)
}
