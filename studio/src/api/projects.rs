//! Project list and template catalogue.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use shared_types::{DocumentTemplate, Project};

use crate::api::{ApiResult, ApiState};
use crate::templates;

#[derive(Debug, Deserialize)]
pub struct ListProjectsQuery {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

pub async fn list_templates() -> Json<Vec<DocumentTemplate>> {
    Json(templates::builtin_templates())
}

pub async fn list_projects(
    State(state): State<ApiState>,
    Query(query): Query<ListProjectsQuery>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = state.app_state.projects();
    let listed = match query.q.as_deref() {
        Some(q) => projects.search(q).await?,
        None => projects.list().await?,
    };
    Ok(Json(listed))
}

pub async fn create_project(
    State(state): State<ApiState>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    let project = state
        .app_state
        .projects()
        .create(&req.name, &req.description)
        .await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn delete_project(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.app_state.projects().delete(&id).await?))
}

pub async fn get_project(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.app_state.projects().get(&id).await?))
}
