use log::*;
use sea_orm::DatabaseConnection;

pub use entity::{new_ordered_id, notification_type, notifications, users, Id};

pub mod error;
pub mod notification;
pub mod user;

/// Inserts a pair of demo users so a local instance has actors to describe.
/// Existing rows are left alone.
pub async fn seed_database(db: &DatabaseConnection) {
    let demo_users = [
        ("ava", "Ava Chen"),
        ("ben", "Ben Ortiz"),
    ];

    for (username, display_name) in demo_users {
        let user = users::Model {
            id: Id::new_v4(),
            username: username.to_owned(),
            display_name: display_name.to_owned(),
            avatar_url: format!("https://avatars.example.com/{username}.png"),
        };

        match user::create(db, user).await {
            Ok(user) => info!("Seeded user {} ({})", user.username, user.id),
            Err(e) => warn!("Skipping seed user {username}: {e}"),
        }
    }
}
