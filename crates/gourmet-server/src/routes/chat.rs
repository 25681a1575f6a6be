use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use gourmet::location::LocationContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    // Checked by hand so a non-string prompt gets a useful message
    #[serde(default)]
    prompt_text: Value,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    content: String,
}

fn prompt_text(value: Value) -> Result<String, ApiError> {
    match value {
        Value::String(text) if text.trim().is_empty() => Err(ApiError::BadRequest(
            "promptText must not be empty".to_string(),
        )),
        Value::String(text) => Ok(text),
        _ => Err(ApiError::BadRequest(
            "promptText must be a string".to_string(),
        )),
    }
}

async fn handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let prompt = prompt_text(request.prompt_text)?;
    let location = LocationContext::new(request.latitude, request.longitude)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("chat", %request_id);

    // If the client goes away this handler is dropped, and the guard stops the conversation
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let concierge = state.concierge.clone();
    let task = tokio::spawn(
        async move {
            tracing::info!(
                latitude = location.latitude(),
                longitude = location.longitude(),
                "answering prompt"
            );
            concierge.answer(&prompt, location, cancel).await
        }
        .instrument(span),
    );

    let answer = task
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(ChatResponse {
        content: answer.content(),
    }))
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(handler))
        .with_state(state)
}
