use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use shared_types::ExportFormat;

use crate::api::{ApiError, ApiResult, ApiState};
use crate::export::export_document;

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub project: String,
    pub format: String,
    /// Document title; defaults to the project name.
    #[serde(default)]
    pub title: Option<String>,
}

pub async fn export_project(
    State(state): State<ApiState>,
    Json(req): Json<ExportRequest>,
) -> ApiResult<impl IntoResponse> {
    let format: ExportFormat = req.format.parse().map_err(ApiError::validation)?;
    let draft = state.app_state.drafts().load(&req.project).await?;
    if draft.is_empty() {
        return Err(ApiError::not_found(format!(
            "No saved draft for project: {}",
            req.project
        )));
    }

    let title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(&req.project);
    let document = export_document(title, &draft.sections, format)?;
    tracing::info!(
        project = %req.project,
        format = %format,
        bytes = document.bytes.len(),
        "Document exported"
    );

    Ok((
        [
            (header::CONTENT_TYPE, document.mime.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", document.filename),
            ),
        ],
        document.bytes,
    ))
}
