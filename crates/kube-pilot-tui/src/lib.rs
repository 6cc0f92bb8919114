//! kube-pilot-tui: the fzf front-end bridge
//!
//! Wires the engine in `kube-pilot-core` to fzf: the ANSI palette, key
//! bindings, the `--listen` reload notifier, prompts, the audit log and the
//! session launcher.

pub mod app;
pub mod audit;
pub mod bindings;
pub mod listener;
pub mod palette;
pub mod prompt;

pub use app::{Launcher, build_dispatcher};
pub use audit::AuditLogger;
pub use bindings::{BINDINGS, display_command, fzf_args};
pub use listener::FzfListener;
pub use palette::AnsiPalette;
