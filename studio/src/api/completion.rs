//! Thin proxy: forward messages (or a single prompt) to the completion
//! endpoint and return its raw text.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use shared_types::ChatMessage;

use crate::api::{ApiError, ApiResult, ApiState, ErrorCode};
use crate::completion::SharedCompletionClient;

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub text: String,
}

pub(crate) fn completion_client(state: &ApiState) -> ApiResult<SharedCompletionClient> {
    state.app_state.completion().ok_or_else(|| {
        ApiError::new(
            ErrorCode::Upstream,
            "Completion endpoint is not configured (set COMPLETION_ENDPOINT)",
        )
    })
}

pub async fn complete(
    State(state): State<ApiState>,
    Json(req): Json<CompleteRequest>,
) -> ApiResult<Json<CompleteResponse>> {
    let client = completion_client(&state)?;
    let prompt = req
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let text = match (req.messages.is_empty(), prompt) {
        (false, _) => client.complete(&req.messages).await?,
        (true, Some(prompt)) => client.complete_prompt(prompt).await?,
        (true, None) => {
            return Err(ApiError::validation(
                "request needs either messages or a prompt",
            ))
        }
    };
    Ok(Json(CompleteResponse { text }))
}
