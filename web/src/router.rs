use crate::controller::{event_controller, health_check_controller, notification_controller};
use crate::extractors::authenticated_user::AUTHENTICATED_USER_HEADER;
use crate::ws::handler;
use crate::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Notify Hub API"
        ),
        paths(
            notification_controller::index,
            notification_controller::mark_read,
            notification_controller::mark_all_read,
            notification_controller::unread_count,
            notification_controller::delete,
            handler::stream_handler,
            event_controller::publish,
            health_check_controller::health_check,
        ),
        components(
            schemas(
                domain::payload::ActorInfo,
                domain::payload::NotificationPayload,
                domain::payload::NotificationPage,
                domain::notification_type::NotificationType,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "notify_hub", description = "Real-time user notifications")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Requests are authenticated upstream; the gateway passes the caller's id in
// a header.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "user_header",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    AUTHENTICATED_USER_HEADER,
                    "Id of the user authenticated by the gateway",
                ))),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(notification_routes(app_state.clone()))
        .merge(stream_routes(app_state.clone()))
        .merge(event_routes(app_state.clone()))
        .merge(health_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn notification_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/notifications", get(notification_controller::index))
        .route(
            "/notifications/unread-count",
            get(notification_controller::unread_count),
        )
        .route(
            "/notifications/read-all",
            put(notification_controller::mark_all_read),
        )
        .route(
            "/notifications/:id/read",
            put(notification_controller::mark_read),
        )
        .route("/notifications/:id", delete(notification_controller::delete))
        .with_state(app_state)
}

fn stream_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/notifications/stream", get(handler::stream_handler))
        .with_state(app_state)
}

fn event_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/events", post(event_controller::publish))
        .with_state(app_state)
}

fn health_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check_controller::health_check))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for path in [
            "/notifications",
            "/notifications/{id}/read",
            "/notifications/read-all",
            "/notifications/unread-count",
            "/notifications/{id}",
            "/notifications/stream",
            "/events",
            "/health",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == path),
                "{path} missing from OpenAPI document"
            );
        }
    }
}
