//! DocumentSession - one open document with its editor, panels and autosave.
//!
//! Opening loads the saved draft (or initializes sections from a template)
//! and starts autosave; closing flushes, stops autosave and stamps the
//! project's word count.

use chrono::{DateTime, Utc};
use shared_types::{Notification, Panel};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::assistant::{AssistantError, AssistantPanel, AssistantPanels, PanelUpdate, RequestTicket};
use crate::autosave::{Autosave, AutosaveArguments, AutosaveConfig, AutosaveError, AutosaveHandle};
use crate::drafts::{DraftError, DraftStore};
use crate::editor::{EditorState, SharedEditor};
use crate::handoff::{Handoff, HandoffFlag};
use crate::panels::PanelVisibility;
use crate::projects::ProjectStore;
use crate::storage::{SharedStorage, StorageError};
use crate::templates;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Draft error: {0}")]
    Draft(#[from] DraftError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Autosave error: {0}")]
    Autosave(#[from] AutosaveError),
}

/// Where the initial sections come from when no draft exists.
#[derive(Debug, Clone, Default)]
pub enum TemplateChoice {
    /// Use the `selected-template` hand-off flag, if any.
    #[default]
    FromHandoff,
    /// A built-in template id.
    Named(String),
    /// Explicit section titles.
    Titles(Vec<String>),
}

/// Selects one panel out of a session's [`AssistantPanels`].
pub type PanelSelector<T> = fn(&mut AssistantPanels) -> &mut AssistantPanel<T>;

pub struct DocumentSession {
    project_name: String,
    editor: SharedEditor,
    panels: PanelVisibility,
    assistant: AssistantPanels,
    active_feature: Option<String>,
    autosave: AutosaveHandle,
    notifications: mpsc::UnboundedReceiver<Notification>,
    notifier: mpsc::UnboundedSender<Notification>,
    projects: ProjectStore,
    restored: bool,
    last_activity: Instant,
    closed: bool,
}

impl DocumentSession {
    /// `projects` should be the server-wide store so word-count updates
    /// share its write lock.
    pub async fn open(
        storage: SharedStorage,
        projects: ProjectStore,
        project_name: &str,
        template: TemplateChoice,
        config: AutosaveConfig,
    ) -> Result<Self, SessionError> {
        let drafts = DraftStore::new(storage.clone());
        let handoff = Handoff::new(storage);

        let draft = drafts.load(project_name).await?;
        let restored = !draft.is_empty();
        let sections = if restored {
            draft.sections
        } else {
            let titles = match template {
                TemplateChoice::Titles(titles) => titles,
                TemplateChoice::Named(id) => template_titles(&id),
                TemplateChoice::FromHandoff => match handoff.take(HandoffFlag::SelectedTemplate).await? {
                    Some(id) => template_titles(&id),
                    None => Vec::new(),
                },
            };
            templates::initial_sections(&titles)
        };

        let mut panels = PanelVisibility::new();
        if handoff.take_bool(HandoffFlag::ShowCitationManager).await? {
            panels.show(Panel::Citations);
        }
        if handoff.take_bool(HandoffFlag::ShowPdfReader).await? {
            panels.show(Panel::PdfReader);
        }

        // A feature naming a panel opens it; anything else is passed on to the client.
        let mut active_feature = None;
        if let Some(feature) = handoff.take(HandoffFlag::ActiveFeature).await? {
            match feature.parse::<Panel>() {
                Ok(panel) => panels.show(panel),
                Err(_) => active_feature = Some(feature.trim().to_string()),
            }
        }

        let editor = EditorState::from_sections(sections).into_shared();
        let (notifier, notifications) = mpsc::unbounded_channel();
        let autosave = Autosave::start(AutosaveArguments {
            project_name: project_name.to_string(),
            editor: editor.clone(),
            drafts,
            config,
            notifier: Some(notifier.clone()),
        })
        .await?;

        tracing::info!(project = %project_name, restored, "Document session opened");

        Ok(Self {
            project_name: project_name.to_string(),
            editor,
            panels,
            assistant: AssistantPanels::default(),
            active_feature,
            autosave,
            notifications,
            notifier,
            projects,
            restored,
            last_activity: Instant::now(),
            closed: false,
        })
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Whether the sections came from a saved draft rather than a template.
    pub fn restored(&self) -> bool {
        self.restored
    }

    pub fn editor(&self) -> &SharedEditor {
        &self.editor
    }

    pub fn panels(&self) -> &PanelVisibility {
        &self.panels
    }

    pub fn panels_mut(&mut self) -> &mut PanelVisibility {
        &mut self.panels
    }

    pub fn assistant_panels(&self) -> &AssistantPanels {
        &self.assistant
    }

    /// The `active-feature` hand-off value when it did not name a panel.
    pub fn active_feature(&self) -> Option<&str> {
        self.active_feature.as_deref()
    }

    pub fn autosave(&self) -> &AutosaveHandle {
        &self.autosave
    }

    /// Pending notifications, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        let mut drained = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            drained.push(notification);
        }
        drained
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    pub fn assistant_panel<T>(&mut self, select: PanelSelector<T>) -> &AssistantPanel<T> {
        select(&mut self.assistant)
    }

    pub fn begin_assistant<T>(&mut self, select: PanelSelector<T>) -> RequestTicket {
        select(&mut self.assistant).begin()
    }

    /// Apply a finished assistant request. A failure of the latest request
    /// is posted to this session's notifications.
    pub fn finish_assistant<T>(
        &mut self,
        select: PanelSelector<T>,
        ticket: RequestTicket,
        result: Result<Vec<T>, AssistantError>,
    ) -> PanelUpdate {
        let update = select(&mut self.assistant).finish(ticket, result);
        if let PanelUpdate::Failed(notification) = &update {
            let _ = self.notifier.send(notification.clone());
        }
        update
    }

    pub async fn save_now(&self) -> Result<Option<DateTime<Utc>>, SessionError> {
        Ok(self.autosave.save_now().await?)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Flush, stop autosave and record the document's word count on its project.
    pub async fn close(mut self) -> Result<Option<DateTime<Utc>>, SessionError> {
        self.shutdown().await
    }

    /// [`DocumentSession::close`] for a session shared behind a lock. Only
    /// the first call does anything.
    pub async fn shutdown(&mut self) -> Result<Option<DateTime<Utc>>, SessionError> {
        if self.closed {
            return Ok(None);
        }
        self.closed = true;
        let total_words = self.editor.lock().await.total_word_count();
        let saved = self.autosave.shutdown().await?;
        if let Err(e) = self
            .projects
            .record_activity(&self.project_name, total_words)
            .await
        {
            tracing::warn!(project = %self.project_name, error = %e, "Failed to record project activity");
        }
        tracing::info!(project = %self.project_name, total_words, "Document session closed");
        Ok(saved)
    }
}

fn template_titles(id: &str) -> Vec<String> {
    match templates::find_template(id) {
        Some(template) => template.sections,
        None => {
            tracing::warn!(template = %id, "Unknown template; using default section");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use shared_types::{NotificationSeverity, WritingSuggestion};
    use std::sync::Arc;

    fn quiet() -> AutosaveConfig {
        AutosaveConfig {
            idle_interval: Duration::from_secs(3600),
            active_interval: Duration::from_secs(3600),
        }
    }

    async fn open(storage: &SharedStorage, project: &str, template: TemplateChoice) -> DocumentSession {
        DocumentSession::open(
            storage.clone(),
            ProjectStore::new(storage.clone()),
            project,
            template,
            quiet(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_open_without_draft_uses_template() {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let session = open(&storage, "Essay", TemplateChoice::Named("essay".to_string())).await;

        assert!(!session.restored());
        let editor = session.editor().lock().await;
        let titles: Vec<_> = editor.sections().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Introduction", "Body", "Conclusion"]);
        assert_eq!(
            editor.active_section().map(|s| s.title.as_str()),
            Some("Introduction")
        );
        drop(editor);
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_consumes_handoff_flags() {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let handoff = Handoff::new(storage.clone());
        handoff
            .set(HandoffFlag::SelectedTemplate, "literature-review")
            .await
            .unwrap();
        handoff
            .set(HandoffFlag::ShowCitationManager, "true")
            .await
            .unwrap();

        let session = open(&storage, "Review", TemplateChoice::FromHandoff).await;

        assert_eq!(session.editor().lock().await.sections().len(), 4);
        assert_eq!(session.panels().visible(), Some(Panel::Citations));
        assert!(handoff
            .peek(HandoffFlag::SelectedTemplate)
            .await
            .unwrap()
            .is_none());
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_active_feature_opens_panel_or_is_kept() {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let handoff = Handoff::new(storage.clone());

        handoff.set(HandoffFlag::ActiveFeature, "pdf-chat").await.unwrap();
        let session = open(&storage, "Notes", TemplateChoice::FromHandoff).await;
        assert_eq!(session.panels().visible(), Some(Panel::PdfChat));
        assert_eq!(session.active_feature(), None);
        session.close().await.unwrap();

        handoff.set(HandoffFlag::ActiveFeature, "grammar").await.unwrap();
        let session = open(&storage, "Notes", TemplateChoice::FromHandoff).await;
        assert_eq!(session.panels().visible(), None);
        assert_eq!(session.active_feature(), Some("grammar"));
        assert!(handoff.peek(HandoffFlag::ActiveFeature).await.unwrap().is_none());
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_template_falls_back_to_main_content() {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let session = open(&storage, "Notes", TemplateChoice::Named("screenplay".to_string())).await;

        let editor = session.editor().lock().await;
        assert_eq!(editor.sections().len(), 1);
        assert_eq!(editor.sections()[0].title, "Main Content");
        drop(editor);
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_records_word_count_on_project() {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let projects = ProjectStore::new(storage.clone());
        projects.create("Thesis Draft", "").await.unwrap();

        let session = DocumentSession::open(
            storage.clone(),
            projects.clone(),
            "Thesis Draft",
            TemplateChoice::Titles(vec!["Abstract".to_string()]),
            quiet(),
        )
        .await
        .unwrap();
        session
            .editor()
            .lock()
            .await
            .update_active_section_content("four words right here");
        session.close().await.unwrap();

        let project = projects.find_by_name("Thesis Draft").await.unwrap().unwrap();
        assert_eq!(project.word_count, 4);
    }

    #[tokio::test]
    async fn test_shutdown_runs_once() {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let mut session = open(&storage, "Essay", TemplateChoice::Named("essay".to_string())).await;

        assert!(session.shutdown().await.unwrap().is_some());
        assert!(session.is_closed());
        assert!(session.shutdown().await.unwrap().is_none());
    }

    fn suggestions(panels: &mut AssistantPanels) -> &mut AssistantPanel<WritingSuggestion> {
        &mut panels.suggestions
    }

    #[tokio::test]
    async fn test_failed_assistant_request_notifies_session() {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let mut session = open(&storage, "Essay", TemplateChoice::Named("essay".to_string())).await;

        let stale = session.begin_assistant(suggestions);
        let latest = session.begin_assistant(suggestions);
        let update = session.finish_assistant(
            suggestions,
            latest,
            Err(AssistantError::Validation("text cannot be empty".to_string())),
        );
        assert!(matches!(update, PanelUpdate::Failed(_)));

        // The older request failing afterwards is dropped without a notification.
        let update = session.finish_assistant(
            suggestions,
            stale,
            Err(AssistantError::Validation("text cannot be empty".to_string())),
        );
        assert_eq!(update, PanelUpdate::Stale);

        let notifications = session.drain_notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].severity, NotificationSeverity::Destructive);
        assert_eq!(notifications[0].title, "Writing suggestions failed");
        assert!(session.assistant_panels().suggestions.items().is_empty());
        session.close().await.unwrap();
    }
}
