use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// GET liveness plus a snapshot of the live streaming connections.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "API router is up and responding to requests"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn health_check(State(app_state): State<AppState>) -> impl IntoResponse {
    let stats = app_state.hub.stats().await;

    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "connected_users": stats.connected_recipients,
            "connections": stats.connections,
        })),
    )
}
