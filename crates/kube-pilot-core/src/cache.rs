//! On-disk view cache and the coordinator that keeps it fresh
//!
//! Every view is one text file under `<cache-dir>/<context>/<namespace>/`.
//! The first line carries metadata (`#kube-pilot kind=<kind> generation=<n>`),
//! the rest is the preformatted table the front-end displays. Files are only
//! ever replaced atomically, so a reader sees either the previous complete
//! entry or the new one.
//!
//! When a refresh fails the entry is replaced by a placeholder whose kind
//! depends on what was there before, never on the error itself:
//!
//! | Existing entry | Written |
//! |---|---|
//! | none, `no-data`, `unreachable` | `unreachable` |
//! | `data` | `connection-lost`, keeping the last table |
//! | `connection-lost` | nothing |

use crate::atomic::{stage, write_atomic};
use crate::constants::CACHE_HEADER_PREFIX;
use crate::errors::{PilotError, failure_detail};
use crate::navigation::Mode;
use crate::session::{NavigationState, cache_root_for, sanitize_component};
use crate::status::resolve;
use crate::table::{Palette, render_containers, render_contexts, render_names, render_pods};
use chrono::{DateTime, Utc};
use kubectl_rs::{ClusterClient, KubectlError, Scope};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;

pub const UNREACHABLE_BANNER: &str = "cluster unreachable, check kubectl setup and context";
pub const CONNECTION_LOST_BANNER: &str = "connection lost, showing last known data";
pub const NO_DATA_BANNER: &str = "no data yet, press ctrl-r to refresh";
pub const NO_RESOURCES: &str = "No resources found";

/// Which view an entry holds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Pods,
    Containers,
    Contexts,
    Resources,
    Objects(String),
}

impl ViewKind {
    /// Cache file name of this view
    pub fn file_name(&self) -> String {
        match self {
            ViewKind::Pods => "pods".to_string(),
            ViewKind::Containers => "containers".to_string(),
            ViewKind::Contexts => "contexts".to_string(),
            ViewKind::Resources => "resources".to_string(),
            ViewKind::Objects(resource_type) => {
                format!("objects-{}", sanitize_component(resource_type))
            }
        }
    }

    /// The view that backs a navigation mode
    pub fn for_mode(mode: &Mode) -> Self {
        match mode {
            Mode::Pods => ViewKind::Pods,
            Mode::Containers(_) => ViewKind::Containers,
            Mode::Contexts => ViewKind::Contexts,
            Mode::Resources => ViewKind::Resources,
            Mode::Objects(resource_type) => ViewKind::Objects(resource_type.clone()),
        }
    }
}

/// (context, namespace, view)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pub context: String,
    pub namespace: String,
    pub view: ViewKind,
}

impl ViewKey {
    pub fn new(scope: &Scope, view: ViewKind) -> Self {
        Self {
            context: scope.context.clone(),
            namespace: scope.namespace.clone(),
            view,
        }
    }

    /// Key of the view the session is currently showing
    pub fn for_state(state: &NavigationState) -> Self {
        Self::new(&state.scope(), ViewKind::for_mode(&state.mode))
    }

    pub fn scope(&self) -> Scope {
        Scope::new(&self.context, &self.namespace)
    }

    /// Same scope, different view
    pub fn with_view(&self, view: ViewKind) -> Self {
        Self {
            view,
            ..self.clone()
        }
    }
}

impl fmt::Display for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.context,
            self.namespace,
            self.view.file_name()
        )
    }
}

/// What an entry's body represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Data,
    NoData,
    Unreachable,
    ConnectionLost,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Data => "data",
            EntryKind::NoData => "no-data",
            EntryKind::Unreachable => "unreachable",
            EntryKind::ConnectionLost => "connection-lost",
        }
    }

    pub fn is_placeholder(&self) -> bool {
        !matches!(self, EntryKind::Data)
    }
}

impl FromStr for EntryKind {
    type Err = PilotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data" => Ok(EntryKind::Data),
            "no-data" => Ok(EntryKind::NoData),
            "unreachable" => Ok(EntryKind::Unreachable),
            "connection-lost" => Ok(EntryKind::ConnectionLost),
            other => Err(PilotError::Cache(format!("unknown entry kind '{}'", other))),
        }
    }
}

/// One cached view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub kind: EntryKind,
    pub generation: u64,
    pub body: String,
    /// Last modification time of the file (None for unsaved placeholders)
    pub updated: Option<SystemTime>,
}

impl CacheEntry {
    /// An in-memory `no-data` entry shown when nothing could be fetched
    pub fn no_data() -> Self {
        Self {
            kind: EntryKind::NoData,
            generation: 0,
            body: format!("{}\n", NO_DATA_BANNER),
            updated: None,
        }
    }

    /// Whether the entry is older than `max_age`
    pub fn is_stale(&self, max_age: Duration) -> bool {
        match self.updated {
            Some(updated) => updated
                .elapsed()
                .map(|age| age >= max_age)
                .unwrap_or(false),
            None => true,
        }
    }

    fn encode(&self) -> String {
        format!(
            "{} kind={} generation={}\n{}",
            CACHE_HEADER_PREFIX,
            self.kind.as_str(),
            self.generation,
            self.body
        )
    }

    fn decode(content: &str) -> Result<Self, PilotError> {
        let (header, body) = content.split_once('\n').unwrap_or((content, ""));
        let fields = header
            .strip_prefix(CACHE_HEADER_PREFIX)
            .ok_or_else(|| PilotError::Cache("missing cache header".to_string()))?;

        let mut kind = None;
        let mut generation = None;
        for field in fields.split_whitespace() {
            match field.split_once('=') {
                Some(("kind", value)) => kind = Some(value.parse::<EntryKind>()?),
                Some(("generation", value)) => {
                    generation = Some(value.parse::<u64>().map_err(|_| {
                        PilotError::Cache(format!("bad generation '{}'", value))
                    })?)
                }
                _ => {}
            }
        }

        Ok(Self {
            kind: kind.ok_or_else(|| PilotError::Cache("missing kind".to_string()))?,
            generation: generation.unwrap_or(0),
            body: body.to_string(),
            updated: None,
        })
    }
}

/// Reads and atomically replaces cache files
#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_dir: PathBuf,
}

impl CacheStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn path(&self, key: &ViewKey) -> PathBuf {
        cache_root_for(&self.cache_dir, &key.context, &key.namespace).join(key.view.file_name())
    }

    /// Current entry, or None when the view was never cached
    pub fn read(&self, key: &ViewKey) -> Result<Option<CacheEntry>, PilotError> {
        let path = self.path(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut entry = CacheEntry::decode(&content)?;
        entry.updated = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
        Ok(Some(entry))
    }

    /// Replace an entry, bumping its generation
    pub fn write(
        &self,
        key: &ViewKey,
        kind: EntryKind,
        body: String,
    ) -> Result<CacheEntry, PilotError> {
        let mut entry = self.next_entry(key, kind, body);
        let path = self.path(key);
        write_atomic(&path, entry.encode().as_bytes())?;
        entry.updated = Some(SystemTime::now());
        Ok(entry)
    }

    /// Write the next entry to a temp file without making it visible
    ///
    /// Persisting the returned file completes the replacement.
    pub fn stage(
        &self,
        key: &ViewKey,
        kind: EntryKind,
        body: String,
    ) -> Result<NamedTempFile, PilotError> {
        let entry = self.next_entry(key, kind, body);
        Ok(stage(&self.path(key), entry.encode().as_bytes())?)
    }

    fn next_entry(&self, key: &ViewKey, kind: EntryKind, body: String) -> CacheEntry {
        // An unreadable previous entry restarts the count
        let generation = match self.read(key) {
            Ok(Some(previous)) => previous.generation + 1,
            _ => 1,
        };
        CacheEntry {
            kind,
            generation,
            body,
            updated: None,
        }
    }
}

type Clock = fn() -> DateTime<Utc>;

/// Fetches views from the cluster and keeps their cache entries current
pub struct CacheCoordinator<C> {
    client: Arc<C>,
    store: CacheStore,
    palette: Arc<dyn Palette>,
    clock: Clock,
}

impl<C> Clone for CacheCoordinator<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            store: self.store.clone(),
            palette: Arc::clone(&self.palette),
            clock: self.clock,
        }
    }
}

impl<C: ClusterClient> CacheCoordinator<C> {
    pub fn new(client: Arc<C>, store: CacheStore, palette: Arc<dyn Palette>) -> Self {
        Self {
            client,
            store,
            palette,
            clock: Utc::now,
        }
    }

    /// Use a fixed clock for ages (tests)
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Current entry of a view, if any
    pub fn read(&self, key: &ViewKey) -> Result<Option<CacheEntry>, PilotError> {
        self.store.read(key)
    }

    /// Fetch a view and replace its entry
    ///
    /// A failed fetch writes the appropriate placeholder and returns the
    /// cluster error. Pods and containers come from the same listing, so
    /// refreshing either rewrites both.
    pub async fn refresh(&self, key: &ViewKey) -> Result<CacheEntry, PilotError> {
        tracing::debug!("Refreshing {}", key);
        match self.fetch(key).await {
            Ok(bodies) => {
                let mut requested = None;
                for (view, kind, body) in bodies {
                    let view_key = key.with_view(view);
                    let entry = self.store.write(&view_key, kind, body)?;
                    if view_key == *key {
                        requested = Some(entry);
                    }
                }
                requested.ok_or_else(|| PilotError::Cache(format!("{} was not produced", key)))
            }
            Err(e) => {
                tracing::warn!("Refresh of {} failed: {}", key, e);
                let detail = failure_detail(&e);
                for view in sibling_views(&key.view) {
                    self.write_placeholder(&key.with_view(view), &detail)?;
                }
                Err(PilotError::Cluster(e))
            }
        }
    }

    /// Read a view, refreshing first when it is missing or older than `max_age`
    ///
    /// Never fails on cluster errors; with nothing cached a `no-data` entry
    /// is returned.
    pub async fn ensure_fresh(
        &self,
        key: &ViewKey,
        max_age: Duration,
    ) -> Result<CacheEntry, PilotError> {
        let needs_refresh = match self.store.read(key) {
            Ok(Some(entry)) => entry.is_stale(max_age),
            Ok(None) => true,
            Err(e) => {
                tracing::warn!("Unreadable cache entry {}: {}", key, e);
                true
            }
        };

        if needs_refresh && let Err(e) = self.refresh(key).await {
            tracing::debug!("Display refresh of {} failed: {}", key, e);
        }

        Ok(self.store.read(key).ok().flatten().unwrap_or_else(CacheEntry::no_data))
    }

    async fn fetch(
        &self,
        key: &ViewKey,
    ) -> Result<Vec<(ViewKind, EntryKind, String)>, KubectlError> {
        let scope = key.scope();
        let palette = self.palette.as_ref();
        match &key.view {
            ViewKind::Pods | ViewKind::Containers => {
                let pods = self.client.list_pods(&scope).await?;
                let resolved = resolve(&pods, (self.clock)());
                Ok(vec![
                    (
                        ViewKind::Pods,
                        EntryKind::Data,
                        render_pods(&resolved.pods, palette),
                    ),
                    (
                        ViewKind::Containers,
                        EntryKind::Data,
                        render_containers(&resolved.containers, palette),
                    ),
                ])
            }
            ViewKind::Contexts => {
                let names = self.client.list_contexts().await?;
                let current = self.client.current_context().await?;
                Ok(vec![(
                    ViewKind::Contexts,
                    EntryKind::Data,
                    render_contexts(&names, &current, palette),
                )])
            }
            ViewKind::Resources => {
                let names = self.client.list_resource_types(&scope).await?;
                Ok(vec![(
                    ViewKind::Resources,
                    EntryKind::Data,
                    render_names("NAME", &names, palette),
                )])
            }
            ViewKind::Objects(resource_type) => {
                let table = self.client.get_table(&scope, resource_type).await?;
                let entry = if table.trim().is_empty() {
                    (EntryKind::NoData, format!("{}\n", NO_RESOURCES))
                } else {
                    (EntryKind::Data, table)
                };
                Ok(vec![(key.view.clone(), entry.0, entry.1)])
            }
        }
    }

    fn write_placeholder(&self, key: &ViewKey, detail: &str) -> Result<(), PilotError> {
        let existing = self.store.read(key).ok().flatten();
        match existing.as_ref().map(|e| e.kind) {
            None | Some(EntryKind::NoData) | Some(EntryKind::Unreachable) => {
                let body = format!("{}\n{}\n", UNREACHABLE_BANNER, detail);
                self.store.write(key, EntryKind::Unreachable, body)?;
            }
            Some(EntryKind::Data) => {
                let previous = existing.map(|e| e.body).unwrap_or_default();
                let body = format!("{} ({})\n{}", CONNECTION_LOST_BANNER, detail, previous);
                self.store.write(key, EntryKind::ConnectionLost, body)?;
            }
            Some(EntryKind::ConnectionLost) => {
                tracing::debug!("{} already marked connection-lost", key);
            }
        }
        Ok(())
    }
}

/// Views written by the same fetch
fn sibling_views(view: &ViewKind) -> Vec<ViewKind> {
    match view {
        ViewKind::Pods | ViewKind::Containers => vec![ViewKind::Pods, ViewKind::Containers],
        other => vec![other.clone()],
    }
}
