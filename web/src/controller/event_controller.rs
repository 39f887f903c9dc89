use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use events::DomainEvent;

use crate::controller::ApiResponse;
use crate::AppState;
use log::*;

pub const EVENTS_SECRET_HEADER: &str = "x-events-secret";

/// POST an application event from an upstream service (likes, comments,
/// follows, mentions). Accepted immediately; any notification it produces is
/// created and delivered in the background.
///
/// Internal only: the gateway must not expose this route to end users. When
/// an events secret is configured, callers must present it in the
/// `x-events-secret` header.
#[utoipa::path(
    post,
    path = "/events",
    request_body(content = String, description = "A tagged event such as {\"event\": \"video_liked\", ...}", content_type = "application/json"),
    responses(
        (status = 202, description = "Event accepted"),
        (status = 401, description = "Missing or wrong events secret"),
        (status = 422, description = "Unrecognised event")
    )
)]
pub async fn publish(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<DomainEvent>,
) -> impl IntoResponse {
    if let Some(expected_secret) = app_state.config.events_secret() {
        let provided_secret = headers
            .get(EVENTS_SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if provided_secret != expected_secret {
            warn!("Rejected event with a missing or invalid events secret");
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::<()>::no_content(StatusCode::UNAUTHORIZED.into())),
            );
        }
    }

    debug!("POST event: {event:?}");

    app_state.events.publish_detached(event);

    (
        StatusCode::ACCEPTED,
        Json(ApiResponse::<()>::no_content(StatusCode::ACCEPTED.into())),
    )
}
