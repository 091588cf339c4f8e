//! AutosaveActor - periodic draft persistence for one open document.
//!
//! Autosave is a scoped resource: [`Autosave::start`] spawns the actor and
//! returns an [`AutosaveHandle`]; [`AutosaveHandle::stop`] flushes and shuts
//! it down. While running it saves:
//! - on every tick (idle cadence, or the faster active cadence),
//! - immediately when the document becomes hidden or is unloaded,
//! - on explicit `save_now` / `flush` requests.
//!
//! Background saves never retry. The first failure after a success raises
//! one destructive notification; later failures stay quiet until a save
//! succeeds again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use shared_types::Notification;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::drafts::DraftStore;
use crate::editor::SharedEditor;

pub type NotificationSender = mpsc::UnboundedSender<Notification>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveConfig {
    pub idle_interval: Duration,
    pub active_interval: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            idle_interval: Duration::from_secs(30),
            active_interval: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AutosaveError {
    #[error("Save failed: {0}")]
    Save(String),
    #[error("Autosave unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Default)]
pub struct AutosaveActor;

#[derive(Clone)]
pub struct AutosaveArguments {
    pub project_name: String,
    pub editor: SharedEditor,
    pub drafts: DraftStore,
    pub config: AutosaveConfig,
    pub notifier: Option<NotificationSender>,
}

pub struct AutosaveState {
    project_name: String,
    editor: SharedEditor,
    drafts: DraftStore,
    config: AutosaveConfig,
    notifier: Option<NotificationSender>,
    active: bool,
    ticker: Option<JoinHandle<()>>,
    failure_reported: bool,
    last_saved: Option<DateTime<Utc>>,
}

type SaveReply = RpcReplyPort<Result<Option<DateTime<Utc>>, AutosaveError>>;

#[derive(Debug)]
pub enum AutosaveMsg {
    Tick,
    /// Switch between the active and idle cadence.
    SetActive(bool),
    VisibilityChanged {
        hidden: bool,
    },
    Unload,
    /// User-requested save; outcome is both returned and notified.
    SaveNow {
        reply: SaveReply,
    },
    /// Save without notifications.
    Flush {
        reply: SaveReply,
    },
    LastSaved {
        reply: RpcReplyPort<Option<DateTime<Utc>>>,
    },
}

#[async_trait]
impl Actor for AutosaveActor {
    type Msg = AutosaveMsg;
    type State = AutosaveState;
    type Arguments = AutosaveArguments;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            actor_id = %myself.get_id(),
            project = %args.project_name,
            idle_ms = args.config.idle_interval.as_millis() as u64,
            active_ms = args.config.active_interval.as_millis() as u64,
            "AutosaveActor starting"
        );
        let ticker = spawn_ticker(myself, args.config.idle_interval);

        Ok(AutosaveState {
            project_name: args.project_name,
            editor: args.editor,
            drafts: args.drafts,
            config: args.config,
            notifier: args.notifier,
            active: false,
            ticker: Some(ticker),
            failure_reported: false,
            last_saved: None,
        })
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        if let Some(ticker) = state.ticker.take() {
            ticker.abort();
        }
        tracing::info!(project = %state.project_name, "AutosaveActor stopped");
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            AutosaveMsg::Tick => {
                self.background_save(state, "interval").await;
            }
            AutosaveMsg::SetActive(active) => {
                if state.active != active {
                    state.active = active;
                    let period = if active {
                        state.config.active_interval
                    } else {
                        state.config.idle_interval
                    };
                    if let Some(old) = state.ticker.take() {
                        old.abort();
                    }
                    state.ticker = Some(spawn_ticker(myself, period));
                    tracing::debug!(
                        project = %state.project_name,
                        active,
                        period_ms = period.as_millis() as u64,
                        "Autosave cadence changed"
                    );
                }
            }
            AutosaveMsg::VisibilityChanged { hidden } => {
                if hidden {
                    self.background_save(state, "visibility_hidden").await;
                }
            }
            AutosaveMsg::Unload => {
                self.background_save(state, "unload").await;
            }
            AutosaveMsg::SaveNow { reply } => {
                let result = self.save(state).await;
                match &result {
                    Ok(Some(_)) => {
                        state.failure_reported = false;
                        notify(state, Notification::info("Saved", "Your draft has been saved."));
                    }
                    Ok(None) => {
                        notify(state, Notification::info("Nothing to save", "This document has no sections yet."));
                    }
                    Err(e) => {
                        tracing::error!(project = %state.project_name, error = %e, "Manual save failed");
                        notify(state, Notification::destructive("Save failed", e.to_string()));
                    }
                }
                let _ = reply.send(result);
            }
            AutosaveMsg::Flush { reply } => {
                let result = self.save(state).await;
                if let Err(e) = &result {
                    tracing::error!(project = %state.project_name, error = %e, "Flush failed");
                }
                let _ = reply.send(result);
            }
            AutosaveMsg::LastSaved { reply } => {
                let _ = reply.send(state.last_saved);
            }
        }
        Ok(())
    }
}

impl AutosaveActor {
    async fn save(
        &self,
        state: &mut AutosaveState,
    ) -> Result<Option<DateTime<Utc>>, AutosaveError> {
        let sections = state.editor.lock().await.sections().to_vec();
        if sections.is_empty() {
            return Ok(None);
        }
        let saved_at = state
            .drafts
            .save(&state.project_name, &sections)
            .await
            .map_err(|e| AutosaveError::Save(e.to_string()))?;
        state.last_saved = Some(saved_at);
        Ok(Some(saved_at))
    }

    async fn background_save(&self, state: &mut AutosaveState, reason: &'static str) {
        match self.save(state).await {
            Ok(Some(saved_at)) => {
                state.failure_reported = false;
                tracing::debug!(
                    project = %state.project_name,
                    reason,
                    saved_at = %saved_at.to_rfc3339(),
                    "Autosaved draft"
                );
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(project = %state.project_name, reason, error = %e, "Autosave failed");
                if !state.failure_reported {
                    state.failure_reported = true;
                    notify(
                        state,
                        Notification::destructive(
                            "Autosave failed",
                            format!("Your latest changes could not be saved: {e}"),
                        ),
                    );
                }
            }
        }
    }
}

fn notify(state: &AutosaveState, notification: Notification) {
    if let Some(tx) = &state.notifier {
        let _ = tx.send(notification);
    }
}

fn spawn_ticker(actor: ActorRef<AutosaveMsg>, period: Duration) -> JoinHandle<()> {
    let period = period.max(Duration::from_millis(10));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // first tick is immediate; skip it
        loop {
            ticker.tick().await;
            if actor.cast(AutosaveMsg::Tick).is_err() {
                break;
            }
        }
    })
}

pub struct Autosave;

impl Autosave {
    pub async fn start(args: AutosaveArguments) -> Result<AutosaveHandle, AutosaveError> {
        let (actor, join) = Actor::spawn(None, AutosaveActor, args)
            .await
            .map_err(|e| AutosaveError::Unavailable(e.to_string()))?;
        Ok(AutosaveHandle {
            actor,
            join: Some(join),
        })
    }
}

/// Owner handle of a running autosave actor.
///
/// Dropping the handle stops the actor without a final save; call
/// [`AutosaveHandle::stop`] to flush first.
pub struct AutosaveHandle {
    actor: ActorRef<AutosaveMsg>,
    join: Option<JoinHandle<()>>,
}

impl AutosaveHandle {
    pub fn set_active(&self, active: bool) {
        let _ = self.actor.cast(AutosaveMsg::SetActive(active));
    }

    pub fn visibility_changed(&self, hidden: bool) {
        let _ = self.actor.cast(AutosaveMsg::VisibilityChanged { hidden });
    }

    pub fn unload(&self) {
        let _ = self.actor.cast(AutosaveMsg::Unload);
    }

    pub async fn save_now(&self) -> Result<Option<DateTime<Utc>>, AutosaveError> {
        ractor::call!(self.actor, |reply| AutosaveMsg::SaveNow { reply })
            .map_err(|e| AutosaveError::Unavailable(e.to_string()))?
    }

    pub async fn flush(&self) -> Result<Option<DateTime<Utc>>, AutosaveError> {
        ractor::call!(self.actor, |reply| AutosaveMsg::Flush { reply })
            .map_err(|e| AutosaveError::Unavailable(e.to_string()))?
    }

    pub async fn last_saved(&self) -> Option<DateTime<Utc>> {
        ractor::call!(self.actor, |reply| AutosaveMsg::LastSaved { reply })
            .ok()
            .flatten()
    }

    /// Flush pending edits, then stop the actor and its ticker.
    pub async fn stop(mut self) -> Result<Option<DateTime<Utc>>, AutosaveError> {
        self.shutdown().await
    }

    /// [`AutosaveHandle::stop`] without giving up the handle. Only the first
    /// call flushes; later calls return `Ok(None)`.
    pub async fn shutdown(&mut self) -> Result<Option<DateTime<Utc>>, AutosaveError> {
        let Some(join) = self.join.take() else {
            return Ok(None);
        };
        let flushed = self.flush().await;
        self.actor.stop(None);
        if let Err(e) = join.await {
            tracing::warn!(error = %e, "Autosave actor task ended abnormally");
        }
        flushed
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.actor.stop(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorState;
    use crate::storage::{MemoryStorage, StorageError, StoragePort};
    use shared_types::{NotificationSeverity, Section};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        failing: AtomicBool,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl StoragePort for FlakyStorage {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StorageError::Backend("quota exceeded".to_string()));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key).await
        }
    }

    fn fast_config() -> AutosaveConfig {
        AutosaveConfig {
            idle_interval: Duration::from_millis(20),
            active_interval: Duration::from_millis(20),
        }
    }

    fn slow_config() -> AutosaveConfig {
        AutosaveConfig {
            idle_interval: Duration::from_secs(3600),
            active_interval: Duration::from_secs(3600),
        }
    }

    async fn start(
        storage: Arc<FlakyStorage>,
        sections: Vec<Section>,
        config: AutosaveConfig,
    ) -> (
        AutosaveHandle,
        SharedEditor,
        mpsc::UnboundedReceiver<Notification>,
    ) {
        let editor = EditorState::from_sections(sections).into_shared();
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = Autosave::start(AutosaveArguments {
            project_name: "Thesis".to_string(),
            editor: editor.clone(),
            drafts: DraftStore::new(storage),
            config,
            notifier: Some(tx),
        })
        .await
        .unwrap();
        (handle, editor, rx)
    }

    #[tokio::test]
    async fn test_interval_tick_saves_current_sections() {
        let storage = Arc::new(FlakyStorage::default());
        let (handle, editor, _rx) =
            start(storage.clone(), vec![Section::new("Abstract", 0)], fast_config()).await;

        editor.lock().await.update_active_section_content("Hello world");
        tokio::time::sleep(Duration::from_millis(120)).await;

        let draft = DraftStore::new(storage.clone()).load("Thesis").await.unwrap();
        assert_eq!(draft.sections[0].content, "Hello world");
        assert!(handle.last_saved().await.is_some());
        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_no_sections_means_no_save() {
        let storage = Arc::new(FlakyStorage::default());
        let (handle, _editor, _rx) = start(storage.clone(), Vec::new(), fast_config()).await;

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(handle.flush().await.unwrap(), None);
        assert_eq!(storage.writes.load(Ordering::SeqCst), 0);
        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_hidden_and_unload_save_immediately() {
        let storage = Arc::new(FlakyStorage::default());
        let (handle, editor, _rx) =
            start(storage.clone(), vec![Section::new("Abstract", 0)], slow_config()).await;

        editor.lock().await.update_active_section_content("first");
        handle.visibility_changed(false);
        handle.visibility_changed(true);
        // A call after the casts is processed after them.
        handle.last_saved().await;
        assert_eq!(storage.writes.load(Ordering::SeqCst), 1);

        handle.unload();
        handle.last_saved().await;
        assert_eq!(storage.writes.load(Ordering::SeqCst), 2);
        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_active_cadence_takes_over() {
        let storage = Arc::new(FlakyStorage::default());
        let config = AutosaveConfig {
            idle_interval: Duration::from_secs(3600),
            active_interval: Duration::from_millis(20),
        };
        let (handle, _editor, _rx) =
            start(storage.clone(), vec![Section::new("Abstract", 0)], config).await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(storage.writes.load(Ordering::SeqCst), 0);

        handle.set_active(true);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(storage.writes.load(Ordering::SeqCst) >= 1);
        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_repeated_failures_notify_once() {
        let storage = Arc::new(FlakyStorage::default());
        storage.failing.store(true, Ordering::SeqCst);
        let (handle, _editor, mut rx) =
            start(storage.clone(), vec![Section::new("Abstract", 0)], slow_config()).await;

        for _ in 0..3 {
            handle.unload();
        }
        handle.last_saved().await;

        let first = rx.try_recv().expect("one failure notification");
        assert_eq!(first.severity, NotificationSeverity::Destructive);
        assert!(rx.try_recv().is_err());

        // Recovery re-arms the notification.
        storage.failing.store(false, Ordering::SeqCst);
        handle.unload();
        storage.failing.store(true, Ordering::SeqCst);
        handle.unload();
        handle.last_saved().await;
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());

        storage.failing.store(false, Ordering::SeqCst);
        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_manual_save_surfaces_result() {
        let storage = Arc::new(FlakyStorage::default());
        let (handle, _editor, mut rx) =
            start(storage.clone(), vec![Section::new("Abstract", 0)], slow_config()).await;

        assert!(handle.save_now().await.unwrap().is_some());
        assert_eq!(rx.try_recv().unwrap().severity, NotificationSeverity::Info);

        storage.failing.store(true, Ordering::SeqCst);
        let err = handle.save_now().await.unwrap_err();
        assert!(matches!(err, AutosaveError::Save(_)));
        assert_eq!(
            rx.try_recv().unwrap().severity,
            NotificationSeverity::Destructive
        );

        storage.failing.store(false, Ordering::SeqCst);
        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_flushes_latest_edit() {
        let storage = Arc::new(FlakyStorage::default());
        let (handle, editor, _rx) =
            start(storage.clone(), vec![Section::new("Abstract", 0)], slow_config()).await;

        editor.lock().await.update_active_section_content("last words");
        assert!(handle.stop().await.unwrap().is_some());

        let draft = DraftStore::new(storage).load("Thesis").await.unwrap();
        assert_eq!(draft.sections[0].content, "last words");
    }

    #[tokio::test]
    async fn test_second_shutdown_is_a_no_op() {
        let storage = Arc::new(FlakyStorage::default());
        let (mut handle, editor, _rx) =
            start(storage.clone(), vec![Section::new("Abstract", 0)], slow_config()).await;

        editor.lock().await.update_active_section_content("done");
        assert!(handle.shutdown().await.unwrap().is_some());
        let writes = storage.writes.load(Ordering::SeqCst);

        assert!(handle.shutdown().await.unwrap().is_none());
        assert_eq!(storage.writes.load(Ordering::SeqCst), writes);
    }
}
