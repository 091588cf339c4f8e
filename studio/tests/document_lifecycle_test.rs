//! Document Lifecycle Tests
//!
//! End-to-end flows through the library: project creation, editing with a
//! live autosave actor, reopening from storage, and assistant failures.

use async_trait::async_trait;
use shared_types::{ChatMessage, NotificationSeverity, WritingSuggestion};
use std::sync::Arc;
use std::time::Duration;

use studio::assistant::{Assistant, AssistantPanel, AssistantPanels, PanelUpdate};
use studio::autosave::AutosaveConfig;
use studio::completion::{CompletionClient, CompletionError};
use studio::projects::ProjectStore;
use studio::session::{DocumentSession, TemplateChoice};
use studio::storage::{SharedStorage, SqliteStorage};

async fn sqlite_storage(temp_dir: &tempfile::TempDir) -> SharedStorage {
    let db_path = temp_dir.path().join("lifecycle.db");
    let db_url = format!("sqlite:{}", db_path.to_str().expect("Invalid database path"));
    Arc::new(
        SqliteStorage::connect(&db_url)
            .await
            .expect("Failed to open database"),
    )
}

fn fast_autosave() -> AutosaveConfig {
    AutosaveConfig {
        idle_interval: Duration::from_millis(20),
        active_interval: Duration::from_millis(20),
    }
}

async fn section_contents(session: &DocumentSession) -> Vec<(String, String)> {
    session
        .editor()
        .lock()
        .await
        .sections()
        .iter()
        .map(|s| (s.title.clone(), s.content.clone()))
        .collect()
}

#[tokio::test]
async fn test_thesis_draft_survives_reopen_after_autosave_tick() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage = sqlite_storage(&temp_dir).await;

    let projects = ProjectStore::new(storage.clone());
    projects
        .create("Thesis Draft", "")
        .await
        .expect("Failed to create project");

    let session = DocumentSession::open(
        storage.clone(),
        projects.clone(),
        "Thesis Draft",
        TemplateChoice::Titles(vec!["Abstract".to_string(), "Introduction".to_string()]),
        fast_autosave(),
    )
    .await
    .expect("Failed to open session");

    {
        let mut editor = session.editor().lock().await;
        assert_eq!(
            editor.active_section().map(|s| s.title.as_str()),
            Some("Abstract")
        );
        assert!(editor.update_active_section_content("Hello world"));
    }
    let typed_at = chrono::Utc::now();

    // Wait for a tick-driven save that happened after the edit.
    let mut ticked = false;
    for _ in 0..50 {
        if let Some(saved) = session.autosave().last_saved().await {
            if saved >= typed_at {
                ticked = true;
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(ticked, "autosave never ran after the edit");
    session.close().await.expect("Failed to close session");

    let reopened = DocumentSession::open(
        storage.clone(),
        projects.clone(),
        "Thesis Draft",
        TemplateChoice::Named("essay".to_string()),
        fast_autosave(),
    )
    .await
    .expect("Failed to reopen session");

    assert!(reopened.restored());
    assert_eq!(
        section_contents(&reopened).await,
        vec![
            ("Abstract".to_string(), "Hello world".to_string()),
            ("Introduction".to_string(), String::new()),
        ]
    );
    reopened.close().await.expect("Failed to close session");

    let project = projects
        .find_by_name("Thesis Draft")
        .await
        .unwrap()
        .expect("Project missing");
    assert_eq!(project.word_count, 2);
}

#[tokio::test]
async fn test_manual_save_posts_info_notification() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage = sqlite_storage(&temp_dir).await;

    let mut session = DocumentSession::open(
        storage.clone(),
        ProjectStore::new(storage),
        "Empty",
        TemplateChoice::Titles(Vec::new()),
        AutosaveConfig::default(),
    )
    .await
    .expect("Failed to open session");

    // The initializer always yields at least "Main Content".
    assert_eq!(session.editor().lock().await.sections().len(), 1);
    assert!(session.save_now().await.unwrap().is_some());

    let notifications = session.drain_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].severity, NotificationSeverity::Info);
    session.close().await.unwrap();
}

struct UnreachableCompletion;

fn suggestions_panel(panels: &mut AssistantPanels) -> &mut AssistantPanel<WritingSuggestion> {
    &mut panels.suggestions
}

#[async_trait]
impl CompletionClient for UnreachableCompletion {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, CompletionError> {
        Err(CompletionError::Network("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_failed_completion_raises_notification_and_keeps_suggestions_empty() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage = sqlite_storage(&temp_dir).await;
    let mut session = DocumentSession::open(
        storage.clone(),
        ProjectStore::new(storage),
        "Essay",
        TemplateChoice::Named("essay".to_string()),
        AutosaveConfig::default(),
    )
    .await
    .expect("Failed to open session");

    let assistant = Assistant::new(Arc::new(UnreachableCompletion));

    let ticket = session.begin_assistant(suggestions_panel);
    assert!(session.assistant_panels().suggestions.is_loading());
    let result = assistant.suggestions("An opening paragraph.").await;
    let update = session.finish_assistant(suggestions_panel, ticket, result);
    assert!(matches!(update, PanelUpdate::Failed(_)));

    let panel = &session.assistant_panels().suggestions;
    assert!(panel.items().is_empty());
    assert!(!panel.is_loading());

    let notifications = session.drain_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].severity, NotificationSeverity::Destructive);
    assert!(notifications[0].message.contains("connection refused"));
    session.close().await.unwrap();
}
