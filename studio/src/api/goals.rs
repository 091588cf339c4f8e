use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared_types::WritingGoal;

use crate::api::{ApiResult, ApiState};
use crate::goals;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    pub title: String,
    pub target_words: u32,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalRequest {
    pub current_words: u32,
}

/// A goal with its derived progress figures.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: WritingGoal,
    pub progress_percent: u8,
    pub complete: bool,
    pub days_remaining: Option<i64>,
    pub words_per_day_needed: Option<u32>,
}

impl From<WritingGoal> for GoalView {
    fn from(goal: WritingGoal) -> Self {
        let today = Utc::now().date_naive();
        Self {
            progress_percent: goals::progress_percent(&goal),
            complete: goals::is_complete(&goal),
            days_remaining: goals::days_remaining(&goal, today),
            words_per_day_needed: goals::words_per_day_needed(&goal, today),
            goal,
        }
    }
}

pub async fn list_goals(State(state): State<ApiState>) -> ApiResult<Json<Vec<GoalView>>> {
    let listed = state.app_state.goals().list().await?;
    Ok(Json(listed.into_iter().map(GoalView::from).collect()))
}

pub async fn create_goal(
    State(state): State<ApiState>,
    Json(req): Json<CreateGoalRequest>,
) -> ApiResult<impl IntoResponse> {
    let goal = state
        .app_state
        .goals()
        .create(&req.title, req.target_words, req.deadline)
        .await?;
    Ok((StatusCode::CREATED, Json(GoalView::from(goal))))
}

pub async fn update_goal(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateGoalRequest>,
) -> ApiResult<Json<GoalView>> {
    let goal = state
        .app_state
        .goals()
        .update_progress(&id, req.current_words)
        .await?;
    Ok(Json(goal.into()))
}

pub async fn delete_goal(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.app_state.goals().remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
