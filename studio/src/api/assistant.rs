//! Assistant routes.
//!
//! `/assistant/*` answers one request directly. The session-scoped routes
//! keep results in the session's panels: only the newest request per panel
//! is applied, and its failure is posted to the session's notifications.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use shared_types::{ChatMessage, DetectionReport, GrammarIssue, WritingSuggestion};
use std::future::Future;

use crate::api::completion::completion_client;
use crate::api::sessions::lock_session;
use crate::api::{ApiResult, ApiState};
use crate::assistant::{Assistant, AssistantError, AssistantPanel, AssistantPanels, PanelUpdate};
use crate::session::PanelSelector;

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfChatRequest {
    /// Text already extracted from the PDF by the client.
    pub document_text: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<WritingSuggestion>,
}

#[derive(Debug, Serialize)]
pub struct GrammarResponse {
    pub issues: Vec<GrammarIssue>,
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
}

fn assistant(state: &ApiState) -> ApiResult<Assistant> {
    completion_client(state).map(Assistant::new)
}

pub async fn suggestions(
    State(state): State<ApiState>,
    Json(req): Json<TextRequest>,
) -> ApiResult<Json<SuggestionsResponse>> {
    let suggestions = assistant(&state)?.suggestions(&req.text).await?;
    Ok(Json(SuggestionsResponse { suggestions }))
}

pub async fn grammar(
    State(state): State<ApiState>,
    Json(req): Json<TextRequest>,
) -> ApiResult<Json<GrammarResponse>> {
    let issues = assistant(&state)?.grammar(&req.text).await?;
    Ok(Json(GrammarResponse { issues }))
}

pub async fn detect(
    State(state): State<ApiState>,
    Json(req): Json<TextRequest>,
) -> ApiResult<Json<DetectionReport>> {
    Ok(Json(assistant(&state)?.detect(&req.text).await?))
}

pub async fn humanize(
    State(state): State<ApiState>,
    Json(req): Json<TextRequest>,
) -> ApiResult<Json<TextResponse>> {
    let text = assistant(&state)?.humanize(&req.text).await?;
    Ok(Json(TextResponse { text }))
}

pub async fn pdf_chat(
    State(state): State<ApiState>,
    Json(req): Json<PdfChatRequest>,
) -> ApiResult<Json<AnswerResponse>> {
    let answer = assistant(&state)?
        .pdf_chat(&req.document_text, &req.history, &req.question)
        .await?;
    Ok(Json(AnswerResponse { answer }))
}

// ============================================================================
// Session-scoped panels
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PanelRequest {
    /// Defaults to the active section's content.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelStatus {
    Applied,
    Stale,
    Failed,
}

impl From<&PanelUpdate> for PanelStatus {
    fn from(update: &PanelUpdate) -> Self {
        match update {
            PanelUpdate::Applied => PanelStatus::Applied,
            PanelUpdate::Stale => PanelStatus::Stale,
            PanelUpdate::Failed(_) => PanelStatus::Failed,
        }
    }
}

/// The panel after this request finished.
#[derive(Debug, Serialize)]
pub struct PanelView<T> {
    pub status: PanelStatus,
    pub loading: bool,
    pub items: Vec<T>,
}

/// Take a ticket, run the request with no session lock held, then apply the
/// result if it is still the newest one.
async fn run_panel<T, F, Fut>(
    state: &ApiState,
    id: &str,
    text: Option<String>,
    select: PanelSelector<T>,
    request: F,
) -> ApiResult<Json<PanelView<T>>>
where
    T: Clone,
    F: FnOnce(Assistant, String) -> Fut,
    Fut: Future<Output = Result<Vec<T>, AssistantError>>,
{
    let assistant = assistant(state)?;
    let (ticket, text) = {
        let mut session = lock_session(state, id).await?;
        let text = match text {
            Some(text) => text,
            None => session
                .editor()
                .lock()
                .await
                .active_section()
                .map(|section| section.content.clone())
                .unwrap_or_default(),
        };
        (session.begin_assistant(select), text)
    };

    let result = request(assistant, text).await;

    let mut session = lock_session(state, id).await?;
    let update = session.finish_assistant(select, ticket, result);
    let panel = session.assistant_panel(select);
    Ok(Json(PanelView {
        status: PanelStatus::from(&update),
        loading: panel.is_loading(),
        items: panel.items().to_vec(),
    }))
}

fn suggestions_panel(panels: &mut AssistantPanels) -> &mut AssistantPanel<WritingSuggestion> {
    &mut panels.suggestions
}

fn grammar_panel(panels: &mut AssistantPanels) -> &mut AssistantPanel<GrammarIssue> {
    &mut panels.grammar
}

fn detection_panel(panels: &mut AssistantPanels) -> &mut AssistantPanel<DetectionReport> {
    &mut panels.detection
}

fn humanize_panel(panels: &mut AssistantPanels) -> &mut AssistantPanel<String> {
    &mut panels.humanize
}

pub async fn session_suggestions(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<PanelRequest>,
) -> ApiResult<Json<PanelView<WritingSuggestion>>> {
    run_panel(&state, &id, req.text, suggestions_panel, |assistant, text| async move {
        assistant.suggestions(&text).await
    })
    .await
}

pub async fn session_grammar(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<PanelRequest>,
) -> ApiResult<Json<PanelView<GrammarIssue>>> {
    run_panel(&state, &id, req.text, grammar_panel, |assistant, text| async move {
        assistant.grammar(&text).await
    })
    .await
}

pub async fn session_detect(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<PanelRequest>,
) -> ApiResult<Json<PanelView<DetectionReport>>> {
    run_panel(&state, &id, req.text, detection_panel, |assistant, text| async move {
        assistant.detect(&text).await.map(|report| vec![report])
    })
    .await
}

pub async fn session_humanize(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<PanelRequest>,
) -> ApiResult<Json<PanelView<String>>> {
    run_panel(&state, &id, req.text, humanize_panel, |assistant, text| async move {
        assistant.humanize(&text).await.map(|rewrite| vec![rewrite])
    })
    .await
}
