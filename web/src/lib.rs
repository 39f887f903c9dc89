use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use domain::notification::NotificationService;
use events::EventPublisher;
use hub::{Hub, SessionConfig};
use log::*;
use service::config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

mod controller;
mod error;
mod extractors;
mod params;
mod router;
mod ws;

pub use error::{Error, Result};
pub use extractors::authenticated_user::AUTHENTICATED_USER_HEADER;

/// Everything a request handler needs. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub hub: Hub,
    pub notifications: Arc<NotificationService>,
    pub events: EventPublisher,
    pub session_config: SessionConfig,
}

impl AppState {
    pub fn new(
        config: Config,
        hub: Hub,
        notifications: Arc<NotificationService>,
        events: EventPublisher,
    ) -> Self {
        let session_config = SessionConfig {
            outbound_queue_capacity: config.outbound_queue_capacity,
            ping_interval: config.ping_interval(),
            pong_wait: config.pong_wait(),
            write_wait: config.write_wait(),
            max_message_bytes: config.max_message_bytes,
        };

        Self {
            config,
            hub,
            notifications,
            events,
            session_config,
        }
    }
}

pub fn define_routes(app_state: AppState) -> axum::Router {
    router::define_routes(app_state)
}

/// Serve the API until ctrl-c, then stop accepting connections and let
/// in-flight requests finish.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let interface = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let server_url = format!("{interface}:{}", app_state.config.port);
    let listener = TcpListener::bind(&server_url).await?;

    let allowed_origins: Vec<HeaderValue> = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();
    info!("CORS allowed origins: {allowed_origins:?}");

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::DELETE, Method::GET, Method::POST, Method::PUT])
        .allow_credentials(true)
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(AUTHENTICATED_USER_HEADER),
        ])
        .allow_origin(allowed_origins);

    info!("Server starting... listening for connections on http://{server_url}");

    axum::serve(listener, define_routes(app_state).layer(cors_layer))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    info!("Shutdown signal received, draining connections");
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use clap::Parser;
    use domain::notification::NotificationPolicy;
    use domain::payload::ActorInfo;
    use domain::store::MemoryStore;
    use domain::Id;
    use hub::HubConfig;

    pub(crate) struct TestApp {
        pub state: AppState,
        pub store: Arc<MemoryStore>,
    }

    pub(crate) fn test_config() -> Config {
        Config::try_parse_from(["notify_hub", "--storage-backend", "memory"]).unwrap()
    }

    pub(crate) fn test_app() -> TestApp {
        let (hub, dispatch) = hub::channel(&HubConfig::default());
        tokio::spawn(dispatch.run());
        let store = Arc::new(MemoryStore::new());
        let notifications = Arc::new(NotificationService::new(
            store.clone(),
            store.clone(),
            hub.clone(),
            NotificationPolicy::default(),
        ));
        let events = EventPublisher::new().with_handler(Arc::new(
            domain::event_handler::NotificationEventHandler::new(notifications.clone()),
        ));

        TestApp {
            state: AppState::new(test_config(), hub, notifications, events),
            store,
        }
    }

    impl TestApp {
        pub(crate) async fn user(&self, username: &str) -> Id {
            let id = Id::new_v4();
            self.store
                .add_user(ActorInfo {
                    id,
                    username: username.to_string(),
                    display_name: username.to_string(),
                    avatar_url: String::new(),
                })
                .await;
            id
        }
    }
}
