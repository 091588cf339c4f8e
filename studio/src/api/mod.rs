//! HTTP API routes for the writing studio.
//!
//! Every error body has the shape `{ "error": { "code", "message" } }`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

pub mod assistant;
pub mod citations;
pub mod completion;
pub mod drafts;
pub mod export;
pub mod goals;
pub mod handoff;
pub mod projects;
pub mod sessions;

use crate::app_state::AppState;
use crate::assistant::AssistantError;
use crate::citations::CitationError;
use crate::completion::CompletionError;
use crate::drafts::DraftError;
use crate::export::ExportError;
use crate::goals::GoalError;
use crate::projects::ProjectError;
use crate::session::SessionError;
use crate::storage::StorageError;

#[derive(Clone)]
pub struct ApiState {
    pub app_state: Arc<AppState>,
}

/// Configure all API routes
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/templates", get(projects::list_templates))
        // Projects
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{id}",
            get(projects::get_project).delete(projects::delete_project),
        )
        // Drafts
        .route(
            "/drafts/{project}",
            get(drafts::load_draft).put(drafts::save_draft),
        )
        .route("/export", post(export::export_project))
        // Document sessions
        .route("/sessions", post(sessions::open_session))
        .route(
            "/sessions/{id}",
            get(sessions::get_session).delete(sessions::close_session),
        )
        .route("/sessions/{id}/active", post(sessions::set_active_section))
        .route("/sessions/{id}/content", put(sessions::update_content))
        .route("/sessions/{id}/sections", post(sessions::create_section))
        .route(
            "/sessions/{id}/panels/{panel}/toggle",
            post(sessions::toggle_panel),
        )
        .route("/sessions/{id}/activity", post(sessions::set_activity))
        .route("/sessions/{id}/visibility", post(sessions::set_visibility))
        .route("/sessions/{id}/save", post(sessions::save_session))
        .route(
            "/sessions/{id}/notifications",
            get(sessions::drain_notifications),
        )
        .route(
            "/sessions/{id}/assistant/suggestions",
            post(assistant::session_suggestions),
        )
        .route(
            "/sessions/{id}/assistant/grammar",
            post(assistant::session_grammar),
        )
        .route(
            "/sessions/{id}/assistant/detect",
            post(assistant::session_detect),
        )
        .route(
            "/sessions/{id}/assistant/humanize",
            post(assistant::session_humanize),
        )
        // Hand-off flags
        .route(
            "/handoff/{flag}",
            get(handoff::peek_flag)
                .put(handoff::set_flag)
                .delete(handoff::take_flag),
        )
        // Citations
        .route(
            "/citations/{project}",
            get(citations::list_citations).post(citations::add_citation),
        )
        .route(
            "/citations/{project}/bibliography",
            get(citations::bibliography),
        )
        .route(
            "/citations/{project}/{id}",
            delete(citations::remove_citation),
        )
        // Goals
        .route("/goals", get(goals::list_goals).post(goals::create_goal))
        .route(
            "/goals/{id}",
            patch(goals::update_goal).delete(goals::delete_goal),
        )
        // Completion proxy and assistant features
        .route("/api/complete", post(completion::complete))
        .route("/assistant/suggestions", post(assistant::suggestions))
        .route("/assistant/grammar", post(assistant::grammar))
        .route("/assistant/detect", post(assistant::detect))
        .route("/assistant/humanize", post(assistant::humanize))
        .route("/assistant/pdf-chat", post(assistant::pdf_chat))
}

/// Health check endpoint
pub async fn health_check(State(state): State<ApiState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "studio",
            "version": env!("CARGO_PKG_VERSION"),
            "completion": state.app_state.completion().is_some(),
        })),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Validation,
    NotFound,
    Unsupported,
    Upstream,
    Storage,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Unsupported => "UNSUPPORTED",
            ErrorCode::Upstream => "UPSTREAM",
            ErrorCode::Storage => "STORAGE",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Validation => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Unsupported => StatusCode::BAD_REQUEST,
            ErrorCode::Upstream => StatusCode::BAD_GATEWAY,
            ErrorCode::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    code: String,
    message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: ErrorDetail,
}

pub fn api_error(code: ErrorCode, message: impl Into<String>) -> Response {
    let body = Json(ErrorResponse {
        error: ErrorDetail {
            code: code.as_str().to_string(),
            message: message.into(),
        },
    });
    (code.status_code(), body).into_response()
}

/// Handler error carrying the wire code; converts from every module error.
#[derive(Debug)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.code == ErrorCode::Storage || self.code == ErrorCode::Upstream {
            tracing::error!(code = self.code.as_str(), message = %self.message, "Request failed");
        }
        api_error(self.code, self.message)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self::new(ErrorCode::Storage, e.to_string())
    }
}

impl From<DraftError> for ApiError {
    fn from(e: DraftError) -> Self {
        Self::new(ErrorCode::Storage, e.to_string())
    }
}

impl From<ProjectError> for ApiError {
    fn from(e: ProjectError) -> Self {
        match e {
            ProjectError::Validation(msg) => Self::validation(msg),
            ProjectError::NotFound(id) => Self::not_found(format!("Project not found: {id}")),
            ProjectError::Storage(e) => e.into(),
        }
    }
}

impl From<CitationError> for ApiError {
    fn from(e: CitationError) -> Self {
        match e {
            CitationError::Validation(msg) => Self::validation(msg),
            CitationError::NotFound(id) => Self::not_found(format!("Citation not found: {id}")),
            CitationError::Storage(e) => e.into(),
        }
    }
}

impl From<GoalError> for ApiError {
    fn from(e: GoalError) -> Self {
        match e {
            GoalError::Validation(msg) => Self::validation(msg),
            GoalError::NotFound(id) => Self::not_found(format!("Goal not found: {id}")),
            GoalError::Storage(e) => e.into(),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        Self::new(ErrorCode::Unsupported, e.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        Self::new(ErrorCode::Storage, e.to_string())
    }
}

impl From<CompletionError> for ApiError {
    fn from(e: CompletionError) -> Self {
        Self::new(ErrorCode::Upstream, e.to_string())
    }
}

impl From<AssistantError> for ApiError {
    fn from(e: AssistantError) -> Self {
        match e {
            AssistantError::Validation(msg) => Self::validation(msg),
            AssistantError::Completion(e) => e.into(),
            AssistantError::Parse(msg) => {
                Self::new(ErrorCode::Upstream, format!("Unreadable assistant reply: {msg}"))
            }
        }
    }
}
