//! Plain HTTP endpoints: health probe and a one-shot translation check.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use serde_json::{Value, json};

use crate::server::AppState;

/// `GET /health` — liveness probe with model identity.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.pool.model_name(),
        "ready": state.pool.is_ready(),
    }))
}

/// `POST /test-whisper` — translate one complete audio file.
///
/// The Content-Type header doubles as the MIME hint and defaults to WAV,
/// which is what arecord/ffmpeg produce when poking the server by hand.
/// Segments come back with full-precision chunk-local timestamps.
pub async fn test_whisper(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    if body.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "no audio body"})),
        );
    }

    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("audio/wav")
        .to_string();

    match state.pool.process(body.to_vec(), &mime_type, 0.0).await {
        Ok(segments) => (StatusCode::OK, Json(json!({ "segments": segments }))),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": e.to_string()})),
        ),
    }
}
