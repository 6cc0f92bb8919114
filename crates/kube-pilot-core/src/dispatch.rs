//! Action dispatcher
//!
//! The single entry point for user actions: load the session, plan the step,
//! perform the side effect, persist the new state, and refresh whatever
//! view the action changed. Also renders the current view for `display`.

use crate::cache::{CacheCoordinator, CacheEntry, EntryKind, ViewKey, ViewKind};
use crate::config::Settings;
use crate::constants::LOG_TAIL_LINES;
use crate::errors::PilotError;
use crate::navigation::{Action, Mode, Step, plan};
use crate::session::{ListenerHandle, NavigationState, SessionStore};
use crate::table::filter_rows;
use kubectl_rs::{ClusterClient, LogsRequest};

/// Result of dispatching one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The action does not apply to the current view
    Ignored,
    /// The view changed
    Moved(Mode),
    /// Text to show the user (describe, logs)
    Output(String),
    /// A side effect completed
    Done(String),
    /// The user declined a confirmation
    Aborted(String),
}

/// Answer to a yes/no confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
}

impl Confirmation {
    /// `y`/`yes` confirm, `n`/`no`/empty decline (case-insensitive)
    pub fn parse(answer: &str) -> Result<Self, PilotError> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Ok(Confirmation::Yes),
            "" | "n" | "no" => Ok(Confirmation::No),
            other => Err(PilotError::InvalidInput(format!(
                "expected y or n, got '{}'",
                other
            ))),
        }
    }
}

/// Parse a replica count typed by the user
pub fn parse_replicas(raw: &str) -> Result<u32, PilotError> {
    raw.trim().parse::<u32>().map_err(|_| {
        PilotError::InvalidInput(format!(
            "replica count must be a non-negative integer, got '{}'",
            raw.trim()
        ))
    })
}

pub struct Dispatcher<C> {
    coordinator: CacheCoordinator<C>,
    sessions: SessionStore,
    settings: Settings,
}

impl<C: ClusterClient> Dispatcher<C> {
    pub fn new(coordinator: CacheCoordinator<C>, sessions: SessionStore, settings: Settings) -> Self {
        Self {
            coordinator,
            sessions,
            settings,
        }
    }

    pub fn coordinator(&self) -> &CacheCoordinator<C> {
        &self.coordinator
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Create the session record for the active context, browsing pods
    pub async fn start_session(
        &self,
        session: &str,
        listener: Option<ListenerHandle>,
    ) -> Result<NavigationState, PilotError> {
        let client = self.coordinator.client();
        let context = client.current_context().await?;
        let namespace = client.current_namespace(&context).await?;

        let mut state =
            NavigationState::new(session, context, namespace, &self.settings.cache_dir);
        state.listener = listener;
        self.sessions.save(&state)?;
        tracing::info!(
            "Session {} started on {}/{}",
            session,
            state.context,
            state.namespace
        );
        Ok(state)
    }

    pub fn end_session(&self, session: &str) -> Result<(), PilotError> {
        self.sessions.remove(session)?;
        tracing::info!("Session {} ended", session);
        Ok(())
    }

    /// Handle one user action
    ///
    /// On any error the persisted state is left as it was.
    pub async fn dispatch(&self, session: &str, action: Action) -> Result<Outcome, PilotError> {
        let mut state = self.sessions.load(session)?;
        let action_name = action.name();
        let step = plan(&state.mode, action);
        tracing::debug!("{} in {} planned as {:?}", action_name, state.mode, step);

        let client = self.coordinator.client();
        let scope = state.scope();

        let outcome = match step {
            Step::Ignore => return Ok(Outcome::Ignored),

            Step::Move(mode) => {
                state.enter(mode.clone());
                self.sessions.save(&state)?;
                Outcome::Moved(mode)
            }

            Step::SwitchContext(context) => {
                client
                    .switch_context(&context)
                    .await
                    .map_err(|e| PilotError::external("switch context", &e))?;
                let namespace = client
                    .current_namespace(&context)
                    .await
                    .map_err(|e| PilotError::external("switch context", &e))?;

                state.set_scope(&context, &namespace, &self.settings.cache_dir);
                state.enter(Mode::Pods);
                self.sessions.save(&state)?;
                self.refresh_quietly(&ViewKey::for_state(&state)).await;
                Outcome::Moved(Mode::Pods)
            }

            Step::OpenResourceType(resource_type) => {
                let mode = Mode::Objects(resource_type);
                state.enter(mode.clone());
                self.sessions.save(&state)?;
                self.refresh_quietly(&ViewKey::for_state(&state)).await;
                Outcome::Moved(mode)
            }

            Step::Describe {
                resource_type,
                name,
            } => {
                let text = client
                    .describe(&scope, &resource_type, &name)
                    .await
                    .map_err(|e| PilotError::external("describe", &e))?;
                self.select_object(&mut state, name)?;
                Outcome::Output(text)
            }

            Step::Exec { pod, container } => {
                client
                    .exec(&scope, &pod, container.as_deref())
                    .await
                    .map_err(|e| PilotError::external("exec", &e))?;
                self.select_object(&mut state, pod.clone())?;
                Outcome::Done(format!("shell in {} closed", pod))
            }

            Step::Logs {
                pod,
                container,
                follow,
                previous,
            } => {
                let request = LogsRequest {
                    pod: pod.clone(),
                    container,
                    previous,
                    tail: Some(LOG_TAIL_LINES),
                };
                let outcome = if follow {
                    client
                        .follow_logs(&scope, &request)
                        .await
                        .map_err(|e| PilotError::external("logs", &e))?;
                    Outcome::Done(format!("stopped following {}", pod))
                } else {
                    let text = client
                        .logs(&scope, &request)
                        .await
                        .map_err(|e| PilotError::external("logs", &e))?;
                    Outcome::Output(text)
                };
                self.select_object(&mut state, pod)?;
                outcome
            }

            Step::Delete {
                resource_type,
                name,
                confirmation,
                force,
            } => {
                if Confirmation::parse(&confirmation)? == Confirmation::No {
                    return Ok(Outcome::Aborted(format!(
                        "delete of {}/{} cancelled",
                        resource_type, name
                    )));
                }
                let message = client
                    .delete(&scope, &resource_type, &name, force)
                    .await
                    .map_err(|e| PilotError::external("delete", &e))?;
                tracing::info!("Deleted {}/{} (force: {})", resource_type, name, force);
                self.select_object(&mut state, name)?;
                self.refresh_quietly(&ViewKey::for_state(&state)).await;
                Outcome::Done(message.trim().to_string())
            }

            Step::Scale {
                resource_type,
                name,
                replicas,
            } => {
                let replicas = parse_replicas(&replicas)?;
                let message = client
                    .scale(&scope, &resource_type, &name, replicas)
                    .await
                    .map_err(|e| PilotError::external("scale", &e))?;
                tracing::info!("Scaled {}/{} to {}", resource_type, name, replicas);
                self.select_object(&mut state, name)?;
                let key = ViewKey::new(&scope, ViewKind::Objects(resource_type));
                self.refresh_quietly(&key).await;
                Outcome::Done(message.trim().to_string())
            }

            Step::Edit {
                resource_type,
                name,
            } => {
                client
                    .edit(&scope, &resource_type, &name)
                    .await
                    .map_err(|e| PilotError::external("edit", &e))?;
                self.select_object(&mut state, name.clone())?;
                self.refresh_quietly(&ViewKey::for_state(&state)).await;
                Outcome::Done(format!("edited {}/{}", resource_type, name))
            }

            Step::Refresh => {
                let key = ViewKey::for_state(&state);
                match self.coordinator.refresh(&key).await {
                    Ok(_) => Outcome::Done(format!("refreshed {}", state.mode)),
                    Err(e) => Outcome::Done(format!("refresh failed: {}", e)),
                }
            }
        };

        if let Outcome::Moved(mode) = &outcome {
            tracing::info!("Session {} moved to {}", session, mode);
        }
        Ok(outcome)
    }

    /// Render the current view: a title line followed by the table
    ///
    /// The output always starts with exactly two non-selectable lines (title
    /// and column header, or title and error detail); placeholder banners are
    /// folded into the title.
    pub async fn display(&self, session: &str) -> Result<String, PilotError> {
        let state = self.sessions.load(session)?;
        let key = ViewKey::for_state(&state);
        let entry = self
            .coordinator
            .ensure_fresh(&key, self.settings.refresh_interval)
            .await?;
        Ok(render_view(&state, &entry))
    }

    fn select_object(&self, state: &mut NavigationState, name: String) -> Result<(), PilotError> {
        state.selected_object = Some(name);
        self.sessions.save(state)
    }

    async fn refresh_quietly(&self, key: &ViewKey) {
        if let Err(e) = self.coordinator.refresh(key).await {
            tracing::warn!("Refresh of {} after action failed: {}", key, e);
        }
    }
}

fn render_view(state: &NavigationState, entry: &CacheEntry) -> String {
    let mut title = format!(
        "{} [{}/{}]",
        state.mode.title(),
        state.context,
        state.namespace
    );
    let mut body = entry.body.as_str();
    if entry.kind.is_placeholder() {
        let (banner, rest) = body.split_once('\n').unwrap_or((body, ""));
        title.push_str(&format!(" ({}) {}", entry.kind.as_str(), banner));
        // Banner-only placeholders still need a second header line
        body = if rest.is_empty() { "\n" } else { rest };
    }
    format!("{}\n{}", title, view_body(&state.mode, entry.kind, body))
}

/// Table body, narrowed to one pod in the containers view
fn view_body(mode: &Mode, kind: EntryKind, body: &str) -> String {
    match (mode, kind) {
        (Mode::Containers(pod), EntryKind::Data | EntryKind::ConnectionLost) => {
            filter_rows(body, pod)
        }
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, UNREACHABLE_BANNER};
    use crate::table::PlainPalette;
    use crate::testing::{FakeCluster, fixed_now};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    struct Fixture {
        _dir: tempfile::TempDir,
        dispatcher: Dispatcher<FakeCluster>,
    }

    impl Fixture {
        fn state(&self) -> NavigationState {
            self.dispatcher.sessions().load("s1").unwrap()
        }

        fn cluster(&self) -> &FakeCluster {
            self.dispatcher.coordinator().client()
        }

        async fn dispatch(&self, action: Action) -> Result<Outcome, PilotError> {
            self.dispatcher.dispatch("s1", action).await
        }

        fn set_mode(&self, mode: Mode) {
            let mut state = self.state();
            state.enter(mode);
            self.dispatcher.sessions().save(&state).unwrap();
        }
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(30, Some(dir.path().to_path_buf()), false).unwrap();
        let coordinator = CacheCoordinator::new(
            Arc::new(FakeCluster::with_web_pod()),
            CacheStore::new(&settings.cache_dir),
            Arc::new(PlainPalette),
        )
        .with_clock(fixed_now);
        let dispatcher = Dispatcher::new(
            coordinator,
            SessionStore::new(settings.sessions_dir()),
            settings,
        );
        dispatcher.start_session("s1", None).await.unwrap();
        Fixture {
            _dir: dir,
            dispatcher,
        }
    }

    fn target(name: &str) -> String {
        name.to_string()
    }

    #[tokio::test]
    async fn test_start_session() {
        let f = fixture().await;
        let state = f.state();
        assert_eq!(state.mode, Mode::Pods);
        assert_eq!((state.context.as_str(), state.namespace.as_str()), ("prod", "default"));
        assert!(state.cache_root.ends_with(PathBuf::from("prod/default")));
    }

    #[tokio::test]
    async fn test_enter_pod_shows_only_its_containers() {
        let f = fixture().await;
        let outcome = f.dispatch(Action::Enter(target("web-7f9"))).await.unwrap();
        assert_eq!(outcome, Outcome::Moved(Mode::Containers(target("web-7f9"))));
        assert_eq!(f.state().selected_pod.as_deref(), Some("web-7f9"));

        let view = f.dispatcher.display("s1").await.unwrap();
        let lines: Vec<&str> = view.lines().collect();
        assert!(lines[0].starts_with("containers of web-7f9 [prod/default]"));
        assert!(lines[1].starts_with("POD"));
        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains("app"));
        assert!(lines[3].contains("sidecar"));
        assert!(!view.contains("api-5c2"));
    }

    #[tokio::test]
    async fn test_display_pods() {
        let f = fixture().await;
        let view = f.dispatcher.display("s1").await.unwrap();
        assert!(view.starts_with("pods [prod/default]\nNAME"));
        assert!(view.contains("web-7f9"));
        assert!(view.contains("CrashLoopBackOff"));

        // Served from cache inside the refresh interval
        let calls = f.cluster().calls();
        f.dispatcher.display("s1").await.unwrap();
        assert_eq!(f.cluster().calls(), calls);
    }

    #[tokio::test]
    async fn test_display_unreachable() {
        let f = fixture().await;
        f.cluster().set_offline(true);
        let view = f.dispatcher.display("s1").await.unwrap();
        assert!(view.starts_with("pods [prod/default] (unreachable)"));
        let lines: Vec<&str> = view.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(UNREACHABLE_BANNER));
        assert!(lines[1].starts_with("Network: "));
    }

    #[tokio::test]
    async fn test_switch_context() {
        let f = fixture().await;
        f.dispatch(Action::SwitchContexts).await.unwrap();
        assert_eq!(f.state().mode, Mode::Contexts);

        let outcome = f.dispatch(Action::Enter(target("dev"))).await.unwrap();
        assert_eq!(outcome, Outcome::Moved(Mode::Pods));
        let state = f.state();
        assert_eq!(state.context, "dev");
        assert_eq!(state.namespace, "sandbox");
        assert_eq!(f.cluster().current(), "dev");

        let pods = f
            .dispatcher
            .coordinator()
            .read(&ViewKey::for_state(&state))
            .unwrap()
            .unwrap();
        assert_eq!(pods.kind, EntryKind::Data);
    }

    #[tokio::test]
    async fn test_switch_to_unknown_context_keeps_state() {
        let f = fixture().await;
        f.set_mode(Mode::Contexts);
        let before = f.state();
        let err = f.dispatch(Action::Enter(target("staging"))).await.unwrap_err();
        assert!(matches!(err, PilotError::ExternalOperation { .. }));
        assert_eq!(f.state(), before);
    }

    #[tokio::test]
    async fn test_open_resource_type_refreshes() {
        let f = fixture().await;
        f.dispatch(Action::BrowseResources).await.unwrap();
        let outcome = f.dispatch(Action::Enter(target("deployments.apps"))).await.unwrap();
        assert_eq!(outcome, Outcome::Moved(Mode::Objects(target("deployments.apps"))));

        let key = ViewKey::for_state(&f.state());
        let entry = f.dispatcher.coordinator().read(&key).unwrap().unwrap();
        assert!(entry.body.contains("UP-TO-DATE"));

        assert_eq!(
            f.dispatch(Action::Back).await.unwrap(),
            Outcome::Moved(Mode::Resources)
        );
    }

    #[tokio::test]
    async fn test_invalid_scale_input_leaves_state() {
        let f = fixture().await;
        f.set_mode(Mode::Objects(target("deployments")));
        let before = f.state();

        for raw in ["abc", "-1", "2.5"] {
            let err = f
                .dispatch(Action::Scale {
                    target: target("api"),
                    replicas: raw.to_string(),
                })
                .await
                .unwrap_err();
            assert!(err.is_invalid_input(), "{} should be rejected", raw);
        }
        assert_eq!(f.state(), before);
        assert!(f.cluster().ops().is_empty());
    }

    #[tokio::test]
    async fn test_scale() {
        let f = fixture().await;
        f.set_mode(Mode::Objects(target("deployments")));
        let outcome = f
            .dispatch(Action::Scale {
                target: target("api"),
                replicas: " 3 ".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Done("deployments/api scaled".to_string()));
        assert_eq!(f.cluster().ops(), vec!["scale deployments api 3"]);
        assert_eq!(f.state().selected_object.as_deref(), Some("api"));
    }

    #[tokio::test]
    async fn test_scale_group_qualified_type_from_resources_view() {
        let f = fixture().await;
        f.dispatch(Action::BrowseResources).await.unwrap();
        let listing = f.dispatcher.display("s1").await.unwrap();
        assert!(listing.contains("deployments.apps"));

        f.dispatch(Action::Enter(target("deployments.apps"))).await.unwrap();
        let outcome = f
            .dispatch(Action::Scale {
                target: target("api"),
                replicas: "3".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Done("deployments.apps/api scaled".to_string())
        );
        assert_eq!(f.cluster().ops(), vec!["scale deployments.apps api 3"]);
        assert_eq!(f.state().mode, Mode::Objects(target("deployments.apps")));
    }

    #[tokio::test]
    async fn test_declined_delete_leaves_state() {
        let f = fixture().await;
        let before = f.state();
        for answer in ["n", "No", ""] {
            let outcome = f
                .dispatch(Action::Delete {
                    target: target("web-7f9"),
                    confirmation: answer.to_string(),
                    force: false,
                })
                .await
                .unwrap();
            assert!(matches!(outcome, Outcome::Aborted(_)));
        }
        let err = f
            .dispatch(Action::Delete {
                target: target("web-7f9"),
                confirmation: "maybe".to_string(),
                force: false,
            })
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(f.state(), before);
        assert!(f.cluster().ops().is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_delete() {
        let f = fixture().await;
        let outcome = f
            .dispatch(Action::Delete {
                target: target("web-7f9"),
                confirmation: "yes".to_string(),
                force: true,
            })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Done("pod \"web-7f9\" deleted".to_string()));
        assert_eq!(f.cluster().ops(), vec!["delete pod web-7f9 --force"]);
    }

    #[tokio::test]
    async fn test_describe_and_logs() {
        let f = fixture().await;
        let outcome = f.dispatch(Action::Describe(target("web-7f9"))).await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Output("Name: web-7f9\nKind: pod\n".to_string())
        );

        let outcome = f
            .dispatch(Action::Logs {
                target: target("api-5c2"),
                container: None,
                follow: false,
                previous: true,
            })
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Output(text) if text.contains("api-5c2")));

        let outcome = f
            .dispatch(Action::Logs {
                target: target("api-5c2"),
                container: None,
                follow: true,
                previous: false,
            })
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Done(_)));
        assert_eq!(f.state().mode, Mode::Pods);
    }

    #[tokio::test]
    async fn test_exec_in_container_view() {
        let f = fixture().await;
        f.set_mode(Mode::Containers(target("web-7f9")));
        f.dispatch(Action::Exec {
            target: target("web-7f9"),
            container: Some(target("sidecar")),
        })
        .await
        .unwrap();
        assert_eq!(f.cluster().ops(), vec!["exec web-7f9 sidecar"]);
    }

    #[tokio::test]
    async fn test_failed_operation_keeps_mode() {
        let f = fixture().await;
        f.set_mode(Mode::Objects(target("configmaps")));
        f.cluster().set_failing(true);
        let before = f.state();
        let err = f.dispatch(Action::EditYaml(target("settings"))).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "edit failed: Permission denied - check RBAC for this user"
        );
        assert_eq!(f.state(), before);
    }

    #[tokio::test]
    async fn test_ignored_actions() {
        let f = fixture().await;
        assert_eq!(f.dispatch(Action::Back).await.unwrap(), Outcome::Ignored);
        assert_eq!(
            f.dispatch(Action::Enter(String::new())).await.unwrap(),
            Outcome::Ignored
        );
        assert_eq!(f.cluster().calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_action() {
        let f = fixture().await;
        let outcome = f.dispatch(Action::Refresh).await.unwrap();
        assert_eq!(outcome, Outcome::Done("refreshed pods".to_string()));

        f.cluster().set_offline(true);
        let outcome = f.dispatch(Action::Refresh).await.unwrap();
        assert!(matches!(outcome, Outcome::Done(msg) if msg.starts_with("refresh failed")));
    }

    #[test]
    fn test_confirmation_parse() {
        assert_eq!(Confirmation::parse("Y").unwrap(), Confirmation::Yes);
        assert_eq!(Confirmation::parse(" yes\n").unwrap(), Confirmation::Yes);
        assert_eq!(Confirmation::parse("").unwrap(), Confirmation::No);
        assert!(Confirmation::parse("sure").is_err());
    }

    #[test]
    fn test_parse_replicas() {
        assert_eq!(parse_replicas("0").unwrap(), 0);
        assert_eq!(parse_replicas("12\n").unwrap(), 12);
        assert!(parse_replicas("").is_err());
        assert!(parse_replicas("-3").is_err());
    }

    fn state_in(mode: Mode) -> NavigationState {
        let mut state = NavigationState::new("s1", "prod", "default", Path::new("/c"));
        state.enter(mode);
        state
    }

    fn entry(kind: EntryKind, body: &str) -> CacheEntry {
        CacheEntry {
            kind,
            generation: 2,
            body: body.to_string(),
            updated: None,
        }
    }

    #[test]
    fn test_connection_lost_banner_joins_title() {
        let lost = entry(
            EntryKind::ConnectionLost,
            "connection lost (refused)\nPOD NAME\nweb app\napi api\n",
        );
        let view = render_view(&state_in(Mode::Containers(target("web"))), &lost);
        assert_eq!(
            view,
            "containers of web [prod/default] (connection-lost) connection lost (refused)\n\
             POD NAME\nweb app\n"
        );

        let view = render_view(&state_in(Mode::Pods), &lost);
        let lines: Vec<&str> = view.lines().collect();
        assert!(lines[0].ends_with("connection lost (refused)"));
        assert_eq!(lines[1], "POD NAME");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_placeholder_layouts_keep_two_header_lines() {
        let unreachable = entry(EntryKind::Unreachable, "cluster unreachable\nNetwork: refused\n");
        let view = render_view(&state_in(Mode::Pods), &unreachable);
        assert_eq!(
            view,
            "pods [prod/default] (unreachable) cluster unreachable\nNetwork: refused\n"
        );

        let empty = entry(EntryKind::NoData, "No resources found\n");
        let view = render_view(&state_in(Mode::Objects(target("secrets"))), &empty);
        assert_eq!(view, "secrets [prod/default] (no-data) No resources found\n\n");
        assert_eq!(view.lines().count(), 2);
    }
}
