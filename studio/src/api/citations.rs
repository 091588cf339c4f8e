use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use shared_types::{Citation, CitationStyle};

use crate::api::{ApiError, ApiResult, ApiState};

#[derive(Debug, Deserialize)]
pub struct BibliographyQuery {
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BibliographyResponse {
    pub style: CitationStyle,
    pub entries: Vec<String>,
}

pub async fn list_citations(
    State(state): State<ApiState>,
    Path(project): Path<String>,
) -> ApiResult<Json<Vec<Citation>>> {
    Ok(Json(state.app_state.citations().list(&project).await?))
}

pub async fn add_citation(
    State(state): State<ApiState>,
    Path(project): Path<String>,
    Json(citation): Json<Citation>,
) -> ApiResult<impl IntoResponse> {
    let added = state.app_state.citations().add(&project, citation).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

pub async fn remove_citation(
    State(state): State<ApiState>,
    Path((project, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.app_state.citations().remove(&project, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bibliography(
    State(state): State<ApiState>,
    Path(project): Path<String>,
    Query(query): Query<BibliographyQuery>,
) -> ApiResult<Json<BibliographyResponse>> {
    let style = match query.style.as_deref() {
        Some(style) => style.parse().map_err(ApiError::validation)?,
        None => CitationStyle::default(),
    };
    let entries = state
        .app_state
        .citations()
        .bibliography(&project, style)
        .await?;
    Ok(Json(BibliographyResponse { style, entries }))
}
