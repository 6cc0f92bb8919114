//! Session launcher
//!
//! `kube-pilot start` checks the external tools, creates the session record,
//! starts the background refresh loop and hands the terminal to fzf. When
//! fzf exits the loop is stopped and the session record removed.

use crate::bindings::{display_command, fzf_args};
use crate::listener::FzfListener;
use crate::palette::AnsiPalette;
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use kube_pilot_core::{
    CacheCoordinator, CacheStore, Dispatcher, ListenerHandle, RefreshLoop, SessionStore, Settings,
};
use kubectl_rs::Kubectl;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;

/// Tools that must be on PATH
pub const REQUIRED_TOOLS: [&str; 2] = ["kubectl", "fzf"];

/// Environment variables the child `display`/`dispatch` processes read
pub const ENV_SESSION: &str = "KUBE_PILOT_SESSION";
pub const ENV_CACHE_DIR: &str = "KUBE_PILOT_CACHE_DIR";
pub const ENV_REFRESH_INTERVAL: &str = "KUBE_PILOT_REFRESH_INTERVAL";
pub const ENV_DEBUG: &str = "KUBE_PILOT_DEBUG";
pub const ENV_LOG_FILE: &str = "KUBE_PILOT_LOG_FILE";
pub const ENV_KUBECONFIG: &str = "KUBECONFIG";

/// fzf exits 1 on no match and 130 on ctrl-c
const FZF_NORMAL_EXITS: [i32; 3] = [0, 1, 130];

/// Fail before any state is created when a tool is missing
pub fn preflight() -> Result<()> {
    for tool in REQUIRED_TOOLS {
        which::which(tool)
            .map_err(|_| eyre!("{} not found on PATH; install it and try again", tool))?;
    }
    Ok(())
}

/// An unused loopback port for fzf's `--listen`
pub fn free_port() -> Result<u16> {
    let socket = TcpListener::bind("127.0.0.1:0").wrap_err("no free port for fzf --listen")?;
    Ok(socket.local_addr()?.port())
}

/// Session id unique to this launch
pub fn new_session_id() -> String {
    format!(
        "{}-{}",
        std::process::id(),
        chrono::Utc::now().format("%Y%m%d%H%M%S")
    )
}

/// Dispatcher over the real kubectl client
pub fn build_dispatcher(settings: &Settings, kubeconfig: Option<&Path>) -> Dispatcher<Kubectl> {
    let client = match kubeconfig {
        Some(path) => Kubectl::with_kubeconfig(path),
        None => Kubectl::new(),
    };
    let coordinator = CacheCoordinator::new(
        Arc::new(client),
        CacheStore::new(settings.cache_dir.clone()),
        Arc::new(AnsiPalette),
    );
    Dispatcher::new(coordinator, SessionStore::new(settings.sessions_dir()), settings.clone())
}

pub struct Launcher {
    settings: Settings,
    /// Path of this binary, used in fzf bindings
    exe: PathBuf,
    kubeconfig: Option<PathBuf>,
    log_file: PathBuf,
}

impl Launcher {
    pub fn new(settings: Settings, exe: PathBuf, log_file: PathBuf) -> Self {
        Self {
            settings,
            exe,
            kubeconfig: None,
            log_file,
        }
    }

    pub fn with_kubeconfig(mut self, kubeconfig: Option<PathBuf>) -> Self {
        self.kubeconfig = kubeconfig;
        self
    }

    /// Run one browsing session until fzf exits
    pub async fn run(&self) -> Result<()> {
        preflight()?;

        let session = new_session_id();
        let listen = format!("127.0.0.1:{}", free_port()?);
        let dispatcher = build_dispatcher(&self.settings, self.kubeconfig.as_deref());

        let state = dispatcher
            .start_session(&session, Some(ListenerHandle::new(listen.clone())))
            .await?;
        // Warm the first view so fzf opens on data
        if let Err(e) = dispatcher.display(&session).await {
            tracing::warn!("Initial render failed: {}", e);
        }

        let exe = self.exe.to_string_lossy().to_string();
        let refresh = RefreshLoop::spawn(
            dispatcher.coordinator().clone(),
            dispatcher.sessions().clone(),
            session.clone(),
            FzfListener::new(&display_command(&exe)),
            self.settings.refresh_interval,
        );

        tracing::info!(
            "Launching fzf on {} for {}/{}",
            listen,
            state.context,
            state.namespace
        );
        let result = self.run_fzf(&exe, &session, &listen).await;

        if let Err(e) = refresh.stop().await {
            tracing::warn!("{}", e);
        }
        dispatcher.end_session(&session)?;
        result
    }

    async fn run_fzf(&self, exe: &str, session: &str, listen: &str) -> Result<()> {
        let mut fzf = Command::new("fzf");
        fzf.args(fzf_args(exe, listen))
            .env("FZF_DEFAULT_COMMAND", display_command(exe));
        for (key, value) in self.child_env(session) {
            fzf.env(key, value);
        }

        let status = fzf.status().await.wrap_err("failed to run fzf")?;
        match status.code() {
            Some(code) if FZF_NORMAL_EXITS.contains(&code) => Ok(()),
            Some(code) => Err(eyre!("fzf exited with status {}", code)),
            None => Err(eyre!("fzf was terminated by a signal")),
        }
    }

    /// Variables that let child invocations find this session
    pub fn child_env(&self, session: &str) -> Vec<(&'static str, String)> {
        let mut env = vec![
            (ENV_SESSION, session.to_string()),
            (
                ENV_CACHE_DIR,
                self.settings.cache_dir.to_string_lossy().to_string(),
            ),
            (
                ENV_REFRESH_INTERVAL,
                self.settings.refresh_interval.as_secs().to_string(),
            ),
            (ENV_DEBUG, self.settings.debug.to_string()),
            (ENV_LOG_FILE, self.log_file.to_string_lossy().to_string()),
        ];
        if let Some(path) = &self.kubeconfig {
            env.push((ENV_KUBECONFIG, path.to_string_lossy().to_string()));
        }
        env
    }
}
