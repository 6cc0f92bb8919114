//! kube-pilot: a terminal browser for Kubernetes clusters built on fzf and kubectl

use clap::{Args, Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use kube_pilot_core::status::resolve;
use kube_pilot_core::table::{render_containers, render_pods};
use kube_pilot_core::{Action, Outcome, Palette, PlainPalette, Settings};
use kube_pilot_tui::app::{ENV_CACHE_DIR, ENV_DEBUG, ENV_LOG_FILE, ENV_REFRESH_INTERVAL, ENV_SESSION};
use kube_pilot_tui::{AnsiPalette, AuditLogger, Launcher, build_dispatcher, prompt};
use kubectl_rs::PodList;
use std::fs::{File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::{EnvFilter, prelude::*};

/// kube-pilot: browse pods, containers and resources with fzf
#[derive(Parser, Debug)]
#[command(name = "kube-pilot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Seconds between background refreshes
    #[arg(long, env = ENV_REFRESH_INTERVAL, default_value = "30", global = true)]
    refresh_interval: u64,

    /// Cache directory (default: <temp>/kube-pilot)
    #[arg(long, env = ENV_CACHE_DIR, global = true)]
    cache_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, env = ENV_DEBUG, global = true)]
    debug: bool,

    /// Log file path (default: <temp>/kube-pilot.log)
    #[arg(long, env = ENV_LOG_FILE, global = true)]
    log_file: Option<PathBuf>,

    /// Session id, set by `start` for its children
    #[arg(long, env = ENV_SESSION, global = true)]
    session: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the browser (default when no command is given)
    Start {
        /// Path to a kubeconfig file
        #[arg(long)]
        kubeconfig: Option<PathBuf>,
    },
    /// Print the current view
    Display,
    /// Run one action against the current view
    Dispatch {
        #[command(subcommand)]
        action: ActionCommand,
    },
    /// Refresh the current view now
    Refresh,
    /// Render pod-list JSON into tables without a cluster
    Render(RenderArgs),
    /// Show the most recent audit log entries
    Audit {
        #[arg(short = 'n', long, default_value = "20")]
        lines: usize,
    },
}

#[derive(Subcommand, Debug)]
enum ActionCommand {
    /// Open the selected row
    Enter {
        #[arg(default_value = "")]
        target: String,
    },
    /// Go up one level
    Back,
    SwitchContexts,
    BrowseResources,
    Describe {
        #[arg(default_value = "")]
        target: String,
    },
    /// Open a shell in a pod
    Exec {
        #[arg(default_value = "")]
        target: String,
        container: Option<String>,
    },
    Logs {
        #[arg(long)]
        follow: bool,
        #[arg(long)]
        previous: bool,
        #[arg(default_value = "")]
        target: String,
        container: Option<String>,
    },
    Delete {
        #[arg(long)]
        force: bool,
        /// Answer the confirmation instead of prompting
        #[arg(long)]
        confirm: Option<String>,
        #[arg(default_value = "")]
        target: String,
    },
    Scale {
        /// Replica count instead of prompting
        #[arg(long)]
        replicas: Option<String>,
        #[arg(default_value = "")]
        target: String,
    },
    EditYaml {
        #[arg(default_value = "")]
        target: String,
    },
    Refresh,
}

impl From<ActionCommand> for Action {
    fn from(command: ActionCommand) -> Self {
        match command {
            ActionCommand::Enter { target } => Action::Enter(target),
            ActionCommand::Back => Action::Back,
            ActionCommand::SwitchContexts => Action::SwitchContexts,
            ActionCommand::BrowseResources => Action::BrowseResources,
            ActionCommand::Describe { target } => Action::Describe(target),
            ActionCommand::Exec { target, container } => Action::Exec { target, container },
            ActionCommand::Logs {
                follow,
                previous,
                target,
                container,
            } => Action::Logs {
                target,
                container,
                follow,
                previous,
            },
            ActionCommand::Delete {
                force,
                confirm,
                target,
            } => Action::Delete {
                target,
                confirmation: confirm.unwrap_or_default(),
                force,
            },
            ActionCommand::Scale { replicas, target } => Action::Scale {
                target,
                replicas: replicas.unwrap_or_default(),
            },
            ActionCommand::EditYaml { target } => Action::EditYaml(target),
            ActionCommand::Refresh => Action::Refresh,
        }
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Pod-list JSON (`kubectl get pods -o json`); stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Write `pods` and `containers` files here instead of printing pods
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// No color escapes
    #[arg(long)]
    plain: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Start { kubeconfig: None });

    color_eyre::install()?;

    // Log to a file only; stdout feeds fzf
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("kube-pilot.log"));
    let log_file = open_log(&log_path, matches!(command, Command::Start { .. }))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(true)
                .with_target(false),
        )
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    let settings = Settings::new(cli.refresh_interval, cli.cache_dir.clone(), cli.debug)?;

    match command {
        Command::Start { kubeconfig } => {
            tracing::info!("Starting kube-pilot");
            let exe = std::env::current_exe().wrap_err("cannot locate the kube-pilot binary")?;
            Launcher::new(settings, exe, log_path)
                .with_kubeconfig(kubeconfig)
                .run()
                .await?;
            tracing::info!("Goodbye!");
        }
        Command::Display => {
            let session = require_session(cli.session)?;
            let dispatcher = build_dispatcher(&settings, None);
            match dispatcher.display(&session).await {
                Ok(view) => print!("{}", view),
                // fzf only shows stdout, so errors become the header line
                Err(e) => println!("kube-pilot: {}\n", e),
            }
        }
        Command::Dispatch { action } => {
            let session = require_session(cli.session)?;
            dispatch(&settings, &session, action.into()).await?;
        }
        Command::Refresh => {
            let session = require_session(cli.session)?;
            dispatch(&settings, &session, Action::Refresh).await?;
        }
        Command::Render(args) => render(&args)?,
        Command::Audit { lines } => {
            for line in AuditLogger::new().read_recent(lines) {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

/// `start` truncates the log; children append to it
fn open_log(path: &Path, truncate: bool) -> Result<File> {
    let file = if truncate {
        File::create(path)?
    } else {
        OpenOptions::new().create(true).append(true).open(path)?
    };
    Ok(file)
}

fn require_session(session: Option<String>) -> Result<String> {
    session.ok_or_else(|| eyre!("no session; run `kube-pilot start` or pass --session"))
}

async fn dispatch(settings: &Settings, session: &str, action: Action) -> Result<()> {
    let dispatcher = build_dispatcher(settings, None);
    let state = dispatcher.sessions().load(session)?;
    let action = prompt::complete_action(&state.mode, action, prompt::ask_terminal)?;
    let needs_terminal = matches!(
        action,
        Action::Delete { .. } | Action::Scale { .. } | Action::EditYaml(_) | Action::Exec { .. }
    );

    let result = dispatcher.dispatch(session, action.clone()).await;
    let scope = format!("{}/{}", state.context, state.namespace);
    AuditLogger::new().record(&scope, &action, &result);

    match result {
        Ok(Outcome::Output(text)) => print!("{}", text),
        Ok(Outcome::Done(message)) | Ok(Outcome::Aborted(message)) => {
            tracing::info!("{}: {}", action.name(), message);
            eprintln!("{}", message);
        }
        Ok(Outcome::Moved(_)) | Ok(Outcome::Ignored) => {}
        Err(e) => {
            tracing::warn!("{} failed: {}", action.name(), e);
            if needs_terminal {
                prompt::pause(&e.to_string())?;
            } else {
                eprintln!("{}", e);
            }
        }
    }
    Ok(())
}

fn render(args: &RenderArgs) -> Result<()> {
    let json = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .wrap_err_with(|| format!("cannot read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let pods = PodList::from_json(&json).wrap_err("input is not a pod list")?;
    let resolved = resolve(&pods, chrono::Utc::now());

    let palette: &dyn Palette = if args.plain { &PlainPalette } else { &AnsiPalette };
    let pods_table = render_pods(&resolved.pods, palette);

    match &args.output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            std::fs::write(dir.join("pods"), &pods_table)?;
            std::fs::write(
                dir.join("containers"),
                render_containers(&resolved.containers, palette),
            )?;
            tracing::info!("Rendered {} pods into {}", resolved.pods.len(), dir.display());
        }
        None => print!("{}", pods_table),
    }
    Ok(())
}
