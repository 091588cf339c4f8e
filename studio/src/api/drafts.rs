use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use shared_types::{Draft, Section};

use crate::api::{ApiResult, ApiState};

#[derive(Debug, Deserialize)]
pub struct SaveDraftRequest {
    pub sections: Vec<Section>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftResponse {
    pub last_saved: chrono::DateTime<chrono::Utc>,
    pub sections: usize,
}

pub async fn load_draft(
    State(state): State<ApiState>,
    Path(project): Path<String>,
) -> ApiResult<Json<Draft>> {
    Ok(Json(state.app_state.drafts().load(&project).await?))
}

pub async fn save_draft(
    State(state): State<ApiState>,
    Path(project): Path<String>,
    Json(req): Json<SaveDraftRequest>,
) -> ApiResult<Json<SaveDraftResponse>> {
    let last_saved = state
        .app_state
        .drafts()
        .save(&project, &req.sections)
        .await?;
    Ok(Json(SaveDraftResponse {
        last_saved,
        sections: req.sections.len(),
    }))
}
