//! Background refresh loop
//!
//! Periodically refreshes whatever view the session is showing and asks the
//! front-end to reload. The stop signal is only observed between ticks, so a
//! refresh that has started always completes.

use crate::cache::{CacheCoordinator, ViewKey};
use crate::errors::PilotError;
use crate::session::{ListenerHandle, SessionStore};
use kubectl_rs::ClusterClient;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Front-end endpoint that re-renders the current view on request
pub trait ReloadListener: Send + Sync + 'static {
    fn notify(&self, handle: &ListenerHandle)
    -> impl Future<Output = Result<(), PilotError>> + Send;
}

/// Forwards reload requests to an in-process channel
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<ListenerHandle>,
}

impl ChannelListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ListenerHandle>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ReloadListener for ChannelListener {
    async fn notify(&self, handle: &ListenerHandle) -> Result<(), PilotError> {
        self.tx
            .send(handle.clone())
            .map_err(|_| PilotError::Session("reload channel closed".to_string()))
    }
}

/// Handle to a running background loop
pub struct RefreshLoop {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshLoop {
    /// Start refreshing the session's current view every `interval`
    ///
    /// The first refresh happens one interval after start.
    pub fn spawn<C, L>(
        coordinator: CacheCoordinator<C>,
        sessions: SessionStore,
        session: String,
        listener: L,
        interval: Duration,
    ) -> Self
    where
        C: ClusterClient + 'static,
        L: ReloadListener,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            tracing::info!("Background refresh started for session {}", session);
            loop {
                tokio::select! {
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                    _ = ticker.tick() => {}
                }
                tick(&coordinator, &sessions, &session, &listener).await;
            }
            tracing::info!("Background refresh stopped for session {}", session);
        });

        Self { stop_tx, task }
    }

    /// Signal the loop and wait for it to finish
    pub async fn stop(self) -> Result<(), PilotError> {
        // A send error means the task already exited
        let _ = self.stop_tx.send(true);
        self.task
            .await
            .map_err(|e| PilotError::Session(format!("refresh task failed: {}", e)))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// One refresh-and-notify round; never fails
async fn tick<C: ClusterClient, L: ReloadListener>(
    coordinator: &CacheCoordinator<C>,
    sessions: &SessionStore,
    session: &str,
    listener: &L,
) {
    let state = match sessions.load(session) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!("Background refresh could not load session: {}", e);
            return;
        }
    };

    let key = ViewKey::for_state(&state);
    tracing::debug!("Background tick for {}", key);
    if let Err(e) = coordinator.refresh(&key).await {
        tracing::debug!("Background refresh of {} failed: {}", key, e);
    }

    if let Some(handle) = &state.listener
        && let Err(e) = listener.notify(handle).await
    {
        tracing::debug!("Reload notification to {} failed: {}", handle, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, EntryKind, ViewKind};
    use crate::session::NavigationState;
    use crate::table::PlainPalette;
    use crate::testing::{FakeCluster, fixed_now};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::timeout;

    const TICK: Duration = Duration::from_millis(20);
    const WAIT: Duration = Duration::from_secs(5);

    struct Fixture {
        _dir: tempfile::TempDir,
        coordinator: CacheCoordinator<FakeCluster>,
        sessions: SessionStore,
        state: NavigationState,
    }

    fn fixture(listener: Option<ListenerHandle>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = CacheCoordinator::new(
            Arc::new(FakeCluster::with_web_pod()),
            CacheStore::new(dir.path()),
            Arc::new(PlainPalette),
        )
        .with_clock(fixed_now);
        let sessions = SessionStore::new(dir.path().join("sessions"));
        let mut state = NavigationState::new("s1", "prod", "default", dir.path());
        state.listener = listener;
        sessions.save(&state).unwrap();
        Fixture {
            _dir: dir,
            coordinator,
            sessions,
            state,
        }
    }

    /// Fails every notification, counting attempts
    struct BrokenListener {
        attempts: Arc<AtomicUsize>,
    }

    impl ReloadListener for BrokenListener {
        async fn notify(&self, _handle: &ListenerHandle) -> Result<(), PilotError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(PilotError::Session("fzf went away".to_string()))
        }
    }

    #[tokio::test]
    async fn test_refreshes_and_notifies() {
        let handle = ListenerHandle::new("127.0.0.1:9999");
        let f = fixture(Some(handle.clone()));
        let (listener, mut rx) = ChannelListener::new();

        let refresh = RefreshLoop::spawn(
            f.coordinator.clone(),
            f.sessions.clone(),
            f.state.session.clone(),
            listener,
            TICK,
        );

        let notified = timeout(WAIT, rx.recv()).await.unwrap();
        assert_eq!(notified, Some(handle));

        let key = ViewKey::for_state(&f.state);
        let entry = f.coordinator.read(&key).unwrap().unwrap();
        assert_eq!(entry.kind, EntryKind::Data);
        assert!(entry.body.contains("web-7f9"));

        refresh.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_follows_current_mode() {
        let mut f = fixture(Some(ListenerHandle::new("x")));
        f.state.enter(crate::navigation::Mode::Resources);
        f.sessions.save(&f.state).unwrap();
        let (listener, mut rx) = ChannelListener::new();

        let refresh = RefreshLoop::spawn(
            f.coordinator.clone(),
            f.sessions.clone(),
            "s1".to_string(),
            listener,
            TICK,
        );
        timeout(WAIT, rx.recv()).await.unwrap();
        refresh.stop().await.unwrap();

        let key = ViewKey::for_state(&f.state);
        assert_eq!(key.view, ViewKind::Resources);
        assert!(f.coordinator.read(&key).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_survives_notification_errors() {
        let f = fixture(Some(ListenerHandle::new("127.0.0.1:1")));
        let attempts = Arc::new(AtomicUsize::new(0));
        let listener = BrokenListener {
            attempts: Arc::clone(&attempts),
        };

        let refresh = RefreshLoop::spawn(
            f.coordinator.clone(),
            f.sessions.clone(),
            "s1".to_string(),
            listener,
            TICK,
        );

        timeout(WAIT, async {
            while attempts.load(Ordering::SeqCst) < 3 {
                tokio::time::sleep(TICK).await;
            }
        })
        .await
        .unwrap();
        assert!(!refresh.is_finished());
        refresh.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_survives_cluster_failures() {
        let f = fixture(Some(ListenerHandle::new("x")));
        f.coordinator.client().set_offline(true);
        let (listener, mut rx) = ChannelListener::new();

        let refresh = RefreshLoop::spawn(
            f.coordinator.clone(),
            f.sessions.clone(),
            "s1".to_string(),
            listener,
            TICK,
        );
        timeout(WAIT, rx.recv()).await.unwrap();
        timeout(WAIT, rx.recv()).await.unwrap();
        refresh.stop().await.unwrap();

        let entry = f
            .coordinator
            .read(&ViewKey::for_state(&f.state))
            .unwrap()
            .unwrap();
        assert_eq!(entry.kind, EntryKind::Unreachable);
    }

    #[tokio::test]
    async fn test_stop_ends_refreshing() {
        let f = fixture(None);
        let (listener, _rx) = ChannelListener::new();
        let refresh = RefreshLoop::spawn(
            f.coordinator.clone(),
            f.sessions.clone(),
            "s1".to_string(),
            listener,
            TICK,
        );

        timeout(WAIT, async {
            while f.coordinator.client().calls() == 0 {
                tokio::time::sleep(TICK).await;
            }
        })
        .await
        .unwrap();

        timeout(WAIT, refresh.stop()).await.unwrap().unwrap();
        let calls = f.coordinator.client().calls();
        tokio::time::sleep(TICK * 5).await;
        assert_eq!(f.coordinator.client().calls(), calls);
    }

    #[tokio::test]
    async fn test_missing_session_does_not_stop_loop() {
        let f = fixture(None);
        let (listener, _rx) = ChannelListener::new();
        let refresh = RefreshLoop::spawn(
            f.coordinator.clone(),
            f.sessions.clone(),
            "missing".to_string(),
            listener,
            TICK,
        );
        tokio::time::sleep(TICK * 4).await;
        assert!(!refresh.is_finished());
        refresh.stop().await.unwrap();
        assert_eq!(f.coordinator.client().calls(), 0);
    }
}
