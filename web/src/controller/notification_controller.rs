use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::notification::IndexParams;
use crate::{AppState, Error};
use domain::Id;
use log::*;

/// GET a page of the caller's notifications, newest first.
#[utoipa::path(
    get,
    path = "/notifications",
    params(IndexParams),
    responses(
        (status = 200, description = "Successfully retrieved a page of notifications", body = domain::payload::NotificationPage),
        (status = 400, description = "Malformed cursor"),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Limit out of range"),
        (status = 502, description = "Backing store unreachable")
    ),
    security(
        ("user_header" = [])
    )
)]
pub async fn index(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Notifications for user {user_id}: {params:?}");

    let page = app_state
        .notifications
        .list(user_id, params.cursor, params.limit)
        .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), page)))
}

/// PUT mark one of the caller's notifications read.
#[utoipa::path(
    put,
    path = "/notifications/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Notification id to mark read")
    ),
    responses(
        (status = 200, description = "Notification is read"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Notification not found"),
        (status = 502, description = "Backing store unreachable")
    ),
    security(
        ("user_header" = [])
    )
)]
pub async fn mark_read(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT mark Notification {id} read for user {user_id}");

    app_state.notifications.mark_read(id, user_id).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        json!({"id": id, "read": true}),
    )))
}

/// PUT mark every one of the caller's notifications read.
#[utoipa::path(
    put,
    path = "/notifications/read-all",
    responses(
        (status = 200, description = "All notifications are read"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Backing store unreachable")
    ),
    security(
        ("user_header" = [])
    )
)]
pub async fn mark_all_read(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT mark all Notifications read for user {user_id}");

    let updated = app_state.notifications.mark_all_read(user_id).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        json!({"updated": updated}),
    )))
}

/// GET the number of the caller's unread notifications.
#[utoipa::path(
    get,
    path = "/notifications/unread-count",
    responses(
        (status = 200, description = "Successfully counted unread notifications"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Backing store unreachable")
    ),
    security(
        ("user_header" = [])
    )
)]
pub async fn unread_count(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let count = app_state.notifications.unread_count(user_id).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        json!({"unread_count": count}),
    )))
}

/// DELETE one of the caller's notifications.
#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    params(
        ("id" = Uuid, Path, description = "Notification id to delete")
    ),
    responses(
        (status = 200, description = "Notification deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Notification not found"),
        (status = 502, description = "Backing store unreachable")
    ),
    security(
        ("user_header" = [])
    )
)]
pub async fn delete(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE Notification {id} for user {user_id}");

    app_state.notifications.delete(id, user_id).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        json!({"id": id}),
    )))
}
