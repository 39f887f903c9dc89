use domain::event_handler::NotificationEventHandler;
use domain::notification::{NotificationPolicy, NotificationService};
use domain::store::{DatabaseStore, MemoryStore, NotificationStore, UserLookup};
use events::EventPublisher;
use hub::HubConfig;
use log::*;
use migration::{Migrator, MigratorTrait};
use service::config::{Config, StorageBackend};
use service::logging::Logger;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to start logger: {e}");
        std::process::exit(1);
    }

    info!(
        "Starting notify_hub [{}] with {} storage",
        config.runtime_env(),
        config.storage_backend
    );

    if config.events_secret().is_none() {
        warn!("No events secret configured, POST /events accepts any caller");
    }

    let (store, users): (Arc<dyn NotificationStore>, Arc<dyn UserLookup>) =
        match config.storage_backend {
            StorageBackend::Postgres => {
                let db = match service::init_database(&config).await {
                    Ok(db) => Arc::new(db),
                    Err(e) => {
                        error!("Failed to establish database connection: {e}");
                        std::process::exit(1);
                    }
                };
                if let Err(e) = Migrator::up(db.as_ref(), None).await {
                    error!("Failed to run database migrations: {e}");
                    std::process::exit(1);
                }
                let store = Arc::new(DatabaseStore::new(db));
                (store.clone(), store)
            }
            StorageBackend::Memory => {
                warn!("Using in-memory storage, notifications will not survive a restart");
                let store = Arc::new(MemoryStore::new());
                (store.clone(), store)
            }
        };

    let (hub, dispatch) = hub::channel(&HubConfig {
        dispatch_queue_capacity: config.dispatch_queue_capacity,
    });
    tokio::spawn(dispatch.run());

    let policy = NotificationPolicy {
        dedup_window: config.dedup_window(),
        ..NotificationPolicy::default()
    };
    let notifications = Arc::new(NotificationService::new(store, users, hub.clone(), policy));
    let events = EventPublisher::new()
        .with_handler(Arc::new(NotificationEventHandler::new(notifications.clone())));

    let app_state = web::AppState::new(config, hub, notifications, events);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped with an error: {e}");
        std::process::exit(1);
    }
}
