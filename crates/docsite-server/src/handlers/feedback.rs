//! Feedback API endpoint.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::feedback::Feedback;
use crate::handlers::client_address;
use crate::state::AppState;

/// Response body for POST /api/feedback.
#[derive(Serialize)]
struct FeedbackResponse {
    message: &'static str,
}

fn respond(status: StatusCode, message: &'static str) -> Response {
    (status, Json(FeedbackResponse { message })).into_response()
}

/// Handle POST /api/feedback.
pub(crate) async fn post_feedback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let feedback = match parse_feedback(&body, &state) {
        Ok(feedback) => feedback,
        Err(reason) => {
            tracing::debug!(reason = %reason, "Rejected feedback");
            return respond(StatusCode::BAD_REQUEST, "fail");
        }
    };

    let client = client_address(&headers);
    if !state.limiter.check(&client) {
        tracing::warn!(client = %client, "Too many feedback requests");
        return respond(StatusCode::TOO_MANY_REQUESTS, "fail");
    }

    let sink = Arc::clone(&state.feedback);
    match tokio::task::spawn_blocking(move || sink.submit(&feedback)).await {
        Ok(Ok(())) => respond(StatusCode::OK, "ok"),
        Ok(Err(message)) => {
            tracing::error!(error = %message, "Failed to record feedback");
            respond(StatusCode::INTERNAL_SERVER_ERROR, "fail")
        }
        Err(e) => {
            tracing::error!(error = %e, "Feedback task failed");
            respond(StatusCode::INTERNAL_SERVER_ERROR, "fail")
        }
    }
}

fn parse_feedback(body: &[u8], state: &AppState) -> Result<Feedback, String> {
    let feedback: Feedback = serde_json::from_slice(body).map_err(|e| e.to_string())?;

    if feedback.feedback.trim().is_empty() {
        return Err("empty feedback".to_owned());
    }
    if !state.has_version(&feedback.version) {
        return Err(format!("unknown version '{}'", feedback.version));
    }

    Ok(feedback)
}
