//! Hand-off flags: the dashboard sets one, the editor consumes it on open.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, ApiResult, ApiState};
use crate::handoff::HandoffFlag;

#[derive(Debug, Deserialize)]
pub struct SetFlagRequest {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct FlagView {
    pub flag: String,
    pub value: Option<String>,
}

fn parse_flag(flag: &str) -> ApiResult<HandoffFlag> {
    flag.parse().map_err(ApiError::validation)
}

pub async fn set_flag(
    State(state): State<ApiState>,
    Path(flag): Path<String>,
    Json(req): Json<SetFlagRequest>,
) -> ApiResult<StatusCode> {
    let flag = parse_flag(&flag)?;
    state.app_state.handoff().set(flag, req.value.trim()).await?;
    tracing::debug!(flag = flag.key(), "Hand-off flag set");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn peek_flag(
    State(state): State<ApiState>,
    Path(flag): Path<String>,
) -> ApiResult<Json<FlagView>> {
    let flag = parse_flag(&flag)?;
    let value = state.app_state.handoff().peek(flag).await?;
    Ok(Json(FlagView {
        flag: flag.key().to_string(),
        value,
    }))
}

/// Read and clear.
pub async fn take_flag(
    State(state): State<ApiState>,
    Path(flag): Path<String>,
) -> ApiResult<Json<FlagView>> {
    let flag = parse_flag(&flag)?;
    let value = state.app_state.handoff().take(flag).await?;
    Ok(Json(FlagView {
        flag: flag.key().to_string(),
        value,
    }))
}
