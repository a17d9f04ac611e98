use super::types::{ErrorResponse, FeedbackResponse};
use crate::feedback::{FeedbackGenerator, FeedbackRecord, FeedbackRequest};
use crate::storage::FeedbackStorage;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<FeedbackGenerator>,
    pub storage: Arc<FeedbackStorage>,
}

pub async fn generate_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, (StatusCode, Json<ErrorResponse>)> {
    info!(
        "Received feedback request for session: {}",
        request.session_id
    );

    if request.session_id.is_empty() {
        return Err(error_response("session_id must not be empty"));
    }

    match state.generator.generate(request).await {
        Ok(feedback) => {
            info!(
                "Successfully generated feedback for session: {}",
                feedback.session_id
            );
            Ok(Json(FeedbackResponse {
                success: true,
                feedback,
            }))
        }
        Err(e) => {
            error!("Failed to generate feedback: {}", e);
            Err(error_response(e.to_string()))
        }
    }
}

pub async fn session_feedback(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<FeedbackRecord>, (StatusCode, Json<ErrorResponse>)> {
    match state.storage.get_for_session(&session_id).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No feedback for session: {session_id}"),
            }),
        )),
        Err(e) => {
            error!(
                "Failed to load feedback for session {}: {}",
                session_id, e
            );
            Err(error_response(e.to_string()))
        }
    }
}

// All fatal pipeline errors collapse to a single 500 envelope.
fn error_response(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}
