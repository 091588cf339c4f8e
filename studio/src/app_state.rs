use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::autosave::AutosaveConfig;
use crate::citations::CitationStore;
use crate::completion::SharedCompletionClient;
use crate::drafts::DraftStore;
use crate::goals::GoalStore;
use crate::handoff::Handoff;
use crate::projects::ProjectStore;
use crate::session::{DocumentSession, SessionError, TemplateChoice};
use crate::storage::SharedStorage;

/// How often the idle watchdog looks for abandoned sessions, at most.
const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(60);

pub type SharedSession = Arc<Mutex<DocumentSession>>;

/// Open document sessions keyed by session id. Hold the registry lock only
/// to look up or remove an entry, never across a session call.
pub type SessionRegistry = Mutex<HashMap<String, SharedSession>>;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    storage: SharedStorage,
    drafts: DraftStore,
    projects: ProjectStore,
    citations: CitationStore,
    goals: GoalStore,
    handoff: Handoff,
    completion: Option<SharedCompletionClient>,
    autosave: AutosaveConfig,
    sessions: SessionRegistry,
}

impl AppState {
    pub fn new(
        storage: SharedStorage,
        completion: Option<SharedCompletionClient>,
        autosave: AutosaveConfig,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                drafts: DraftStore::new(storage.clone()),
                projects: ProjectStore::new(storage.clone()),
                citations: CitationStore::new(storage.clone()),
                goals: GoalStore::new(storage.clone()),
                handoff: Handoff::new(storage.clone()),
                storage,
                completion,
                autosave,
                sessions: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn storage(&self) -> SharedStorage {
        self.inner.storage.clone()
    }

    pub fn drafts(&self) -> &DraftStore {
        &self.inner.drafts
    }

    pub fn projects(&self) -> &ProjectStore {
        &self.inner.projects
    }

    pub fn citations(&self) -> &CitationStore {
        &self.inner.citations
    }

    pub fn goals(&self) -> &GoalStore {
        &self.inner.goals
    }

    pub fn handoff(&self) -> &Handoff {
        &self.inner.handoff
    }

    /// `None` when no completion endpoint is configured.
    pub fn completion(&self) -> Option<SharedCompletionClient> {
        self.inner.completion.clone()
    }

    pub async fn open_session(
        &self,
        project_name: &str,
        template: TemplateChoice,
    ) -> Result<(String, SharedSession), SessionError> {
        let session = DocumentSession::open(
            self.storage(),
            self.inner.projects.clone(),
            project_name,
            template,
            self.inner.autosave,
        )
        .await?;
        let session = Arc::new(Mutex::new(session));
        let session_id = ulid::Ulid::new().to_string();
        self.inner
            .sessions
            .lock()
            .await
            .insert(session_id.clone(), session.clone());
        Ok((session_id, session))
    }

    pub async fn session(&self, session_id: &str) -> Option<SharedSession> {
        self.inner.sessions.lock().await.get(session_id).cloned()
    }

    /// Remove the session from the registry; the caller shuts it down.
    pub async fn take_session(&self, session_id: &str) -> Option<SharedSession> {
        self.inner.sessions.lock().await.remove(session_id)
    }

    /// Close every open session; used on shutdown.
    pub async fn close_all_sessions(&self) {
        let sessions: Vec<(String, SharedSession)> =
            self.inner.sessions.lock().await.drain().collect();
        for (session_id, session) in sessions {
            if let Err(e) = session.lock().await.shutdown().await {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to close session");
            }
        }
    }

    /// Close sessions with no request for `idle_timeout`, flushing each
    /// first. Sessions busy with a request are skipped. Returns how many
    /// were closed.
    pub async fn reap_idle_sessions(&self, idle_timeout: Duration) -> usize {
        let idle: Vec<(String, SharedSession)> = {
            let mut sessions = self.inner.sessions.lock().await;
            let idle_ids: Vec<String> = sessions
                .iter()
                .filter(|(_, session)| {
                    session
                        .try_lock()
                        .map(|session| session.idle_for() >= idle_timeout)
                        .unwrap_or(false)
                })
                .map(|(session_id, _)| session_id.clone())
                .collect();
            idle_ids
                .into_iter()
                .filter_map(|session_id| sessions.remove_entry(&session_id))
                .collect()
        };

        let closed = idle.len();
        for (session_id, session) in idle {
            tracing::warn!(session_id = %session_id, "Document session idle timeout; closing");
            if let Err(e) = session.lock().await.shutdown().await {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to close idle session");
            }
        }
        closed
    }

    /// Background task: close abandoned sessions.
    pub async fn run_idle_watchdog(self: Arc<Self>, idle_timeout: Duration) {
        let check_every = IDLE_CHECK_INTERVAL.min(idle_timeout);
        loop {
            sleep(check_every).await;
            let closed = self.reap_idle_sessions(idle_timeout).await;
            if closed > 0 {
                tracing::info!(closed, "Idle document sessions closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn state() -> AppState {
        AppState::new(
            Arc::new(MemoryStorage::new()),
            None,
            AutosaveConfig {
                idle_interval: Duration::from_secs(3600),
                active_interval: Duration::from_secs(3600),
            },
        )
    }

    #[tokio::test]
    async fn test_idle_session_is_flushed_and_closed() {
        let state = state();
        let (session_id, session) = state
            .open_session("Thesis", TemplateChoice::Titles(vec!["Abstract".to_string()]))
            .await
            .unwrap();
        session
            .lock()
            .await
            .editor()
            .lock()
            .await
            .update_active_section_content("left open");

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(state.reap_idle_sessions(Duration::from_millis(10)).await, 1);

        assert!(state.session(&session_id).await.is_none());
        assert!(session.lock().await.is_closed());
        let draft = state.drafts().load("Thesis").await.unwrap();
        assert_eq!(draft.sections[0].content, "left open");
    }

    #[tokio::test]
    async fn test_recently_touched_session_survives() {
        let state = state();
        let (session_id, _) = state
            .open_session("Essay", TemplateChoice::Named("essay".to_string()))
            .await
            .unwrap();

        assert_eq!(state.reap_idle_sessions(Duration::from_secs(600)).await, 0);
        assert!(state.session(&session_id).await.is_some());
        state.close_all_sessions().await;
        assert!(state.session(&session_id).await.is_none());
    }
}
