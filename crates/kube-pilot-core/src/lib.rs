//! kube-pilot-core: the engine behind kube-pilot
//!
//! Everything between the cluster client and the fuzzy-finder front-end.
//! It is intentionally kept independent of any terminal library so the
//! state machine, cache, and resolver can be tested without a terminal.
//!
//! # Modules
//!
//! - [`status`] - Pod and container status resolution
//! - [`table`] - Table rendering through a [`Palette`]
//! - [`indicators`] - Semantic color tags
//! - [`formatting`] - Ages and cell padding
//! - [`navigation`] - Browsing modes and the transition table
//! - [`session`] - Persisted navigation state
//! - [`cache`] - On-disk view cache and the coordinator that refreshes it
//! - [`refresh`] - Background refresh loop
//! - [`dispatch`] - Action dispatcher and view display
//! - [`errors`] - Error type and user-friendly error messages
//! - [`config`] - Engine settings
//! - [`constants`] - Shared constants (status tokens, defaults)

mod atomic;
pub mod cache;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod errors;
pub mod formatting;
pub mod indicators;
pub mod navigation;
pub mod refresh;
pub mod session;
pub mod status;
pub mod table;

#[cfg(test)]
mod testing;

pub use cache::{CacheCoordinator, CacheEntry, CacheStore, EntryKind, ViewKey, ViewKind};
pub use config::Settings;
pub use dispatch::{Confirmation, Dispatcher, Outcome};
pub use errors::*;
pub use indicators::{ColorTag, RowStyle};
pub use navigation::{Action, Mode, Step};
pub use refresh::{ChannelListener, RefreshLoop, ReloadListener};
pub use session::{ListenerHandle, NavigationState, SessionStore};
pub use status::{ContainerSummary, PodSummary, Resolved};
pub use table::{Palette, PlainPalette};
