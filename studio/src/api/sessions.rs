//! Document session routes.
//!
//! A session is one open document: editor state, panel visibility and a
//! running autosave actor. The frontend relays activity, visibility and
//! unload events so autosave can follow the page lifecycle.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{EditorMetrics, Notification, Panel, Section};
use tokio::sync::OwnedMutexGuard;

use crate::api::{ApiError, ApiResult, ApiState};
use crate::session::{DocumentSession, TemplateChoice};

#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    pub project: String,
    /// Built-in template id.
    #[serde(default)]
    pub template: Option<String>,
    /// Explicit section titles; take precedence over `template`.
    #[serde(default)]
    pub sections: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub section_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateContentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSectionRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivityRequest {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    #[serde(default)]
    pub hidden: bool,
    /// Page is being unloaded.
    #[serde(default)]
    pub unload: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub project: String,
    pub restored: bool,
    pub sections: Vec<Section>,
    pub active_section_id: Option<String>,
    pub metrics: EditorMetrics,
    pub total_words: u32,
    pub visible_panel: Option<Panel>,
    /// Feature the dashboard asked the editor to open.
    pub active_feature: Option<String>,
    pub last_saved: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub saved: bool,
    pub last_saved: Option<DateTime<Utc>>,
}

async fn session_view(id: &str, session: &DocumentSession) -> SessionView {
    let last_saved = session.autosave().last_saved().await;
    let editor = session.editor().lock().await;
    SessionView {
        id: id.to_string(),
        project: session.project_name().to_string(),
        restored: session.restored(),
        sections: editor.sections().to_vec(),
        active_section_id: editor.active_section_id().map(str::to_string),
        metrics: editor.metrics(),
        total_words: editor.total_word_count(),
        visible_panel: session.panels().visible(),
        active_feature: session.active_feature().map(str::to_string),
        last_saved,
    }
}

fn unknown_session(id: &str) -> ApiError {
    ApiError::not_found(format!("Session not found: {id}"))
}

/// Lock one session and mark it active. The registry lock is released
/// before waiting on the session.
pub(crate) async fn lock_session(
    state: &ApiState,
    id: &str,
) -> ApiResult<OwnedMutexGuard<DocumentSession>> {
    let session = state
        .app_state
        .session(id)
        .await
        .ok_or_else(|| unknown_session(id))?;
    let mut session = session.lock_owned().await;
    // Closed while this request waited for it.
    if session.is_closed() {
        return Err(unknown_session(id));
    }
    session.touch();
    Ok(session)
}

pub async fn open_session(
    State(state): State<ApiState>,
    Json(req): Json<OpenSessionRequest>,
) -> ApiResult<impl IntoResponse> {
    let project = req.project.trim();
    if project.is_empty() {
        return Err(ApiError::validation("project name cannot be empty"));
    }
    let template = match (req.sections, req.template) {
        (Some(titles), _) => TemplateChoice::Titles(titles),
        (None, Some(id)) => TemplateChoice::Named(id),
        (None, None) => TemplateChoice::FromHandoff,
    };

    let (session_id, session) = state.app_state.open_session(project, template).await?;
    let session = session.lock().await;
    Ok((StatusCode::CREATED, Json(session_view(&session_id, &session).await)))
}

pub async fn get_session(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionView>> {
    let session = lock_session(&state, &id).await?;
    Ok(Json(session_view(&id, &session).await))
}

pub async fn set_active_section(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<SetActiveRequest>,
) -> ApiResult<Json<SessionView>> {
    let session = lock_session(&state, &id).await?;
    session
        .editor()
        .lock()
        .await
        .set_active_section(req.section_id);
    Ok(Json(session_view(&id, &session).await))
}

pub async fn update_content(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateContentRequest>,
) -> ApiResult<Json<EditorMetrics>> {
    let session = lock_session(&state, &id).await?;
    let mut editor = session.editor().lock().await;
    if !editor.update_active_section_content(req.content) {
        tracing::debug!(session_id = %id, "Content update ignored; no active section");
    }
    Ok(Json(editor.metrics()))
}

pub async fn create_section(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<CreateSectionRequest>,
) -> ApiResult<impl IntoResponse> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::validation("section title cannot be empty"));
    }
    let session = lock_session(&state, &id).await?;
    let section = session.editor().lock().await.create_section(title).clone();
    Ok((StatusCode::CREATED, Json(section)))
}

pub async fn toggle_panel(
    State(state): State<ApiState>,
    Path((id, panel)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let panel: Panel = panel.parse().map_err(ApiError::validation)?;
    let mut session = lock_session(&state, &id).await?;
    let visible = session.panels_mut().toggle(panel);
    Ok(Json(serde_json::json!({ "visiblePanel": visible })))
}

pub async fn set_activity(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<ActivityRequest>,
) -> ApiResult<StatusCode> {
    let session = lock_session(&state, &id).await?;
    session.autosave().set_active(req.active);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_visibility(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<VisibilityRequest>,
) -> ApiResult<StatusCode> {
    let session = lock_session(&state, &id).await?;
    if req.unload {
        session.autosave().unload();
    } else {
        session.autosave().visibility_changed(req.hidden);
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn save_session(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaveResponse>> {
    let session = lock_session(&state, &id).await?;
    let last_saved = session.save_now().await?;
    Ok(Json(SaveResponse {
        saved: last_saved.is_some(),
        last_saved,
    }))
}

pub async fn drain_notifications(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Notification>>> {
    let mut session = lock_session(&state, &id).await?;
    Ok(Json(session.drain_notifications()))
}

pub async fn close_session(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaveResponse>> {
    let session = state
        .app_state
        .take_session(&id)
        .await
        .ok_or_else(|| unknown_session(&id))?;
    let last_saved = session.lock().await.shutdown().await?;
    Ok(Json(SaveResponse {
        saved: last_saved.is_some(),
        last_saved,
    }))
}
