use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::AppState;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::StreamExt;
use hub::Session;
use log::*;

/// Upgrades to a WebSocket that receives the caller's new notifications as
/// they are created. One connection per tab or device; all of them receive
/// every notification.
///
/// Frames are JSON notification payloads. Several payloads queued at once
/// arrive in a single text frame separated by newlines.
#[utoipa::path(
    get,
    path = "/notifications/stream",
    responses(
        (status = 101, description = "Switching to the notification stream"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("user_header" = [])
    )
)]
pub(crate) async fn stream_handler(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    debug!("Upgrading notification stream for user {user_id}");

    let max_message_bytes = app_state.session_config.max_message_bytes;
    ws.max_message_size(max_message_bytes)
        .max_frame_size(max_message_bytes)
        .on_failed_upgrade(move |e| warn!("Notification stream upgrade failed for user {user_id}: {e}"))
        .on_upgrade(move |socket| run_session(socket, app_state, user_id))
}

async fn run_session(socket: WebSocket, app_state: AppState, user_id: domain::Id) {
    let (session, handle) = Session::new(user_id, &app_state.session_config);

    if let Err(e) = app_state.hub.register(handle).await {
        error!("Cannot stream notifications to user {user_id}: {e}");
        return;
    }

    let (sink, stream) = socket.split();
    session.run(sink, stream, app_state.hub).await;
}
