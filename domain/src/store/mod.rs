//! Persistence and user-lookup seams used by the notification service.
//!
//! Two implementations ship with the crate: [`DatabaseStore`] for
//! PostgreSQL through `entity_api`, and [`MemoryStore`] for local runs and
//! tests.

use crate::error::Error;
use crate::notification_type::NotificationType;
use crate::payload::ActorInfo;
use crate::{notifications, Id};
use async_trait::async_trait;
use std::time::Duration;

mod database;
mod memory;

pub use database::DatabaseStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persist a notification. The store assigns the id, the creation time
    /// and an unread flag, ignoring whatever the caller set.
    async fn create(&self, notification: notifications::Model)
        -> Result<notifications::Model, Error>;

    /// Up to `limit` notifications for `recipient_id` in strictly decreasing
    /// id order, starting after `cursor` when one is given.
    async fn list_by_recipient(
        &self,
        recipient_id: Id,
        cursor: Option<Id>,
        limit: u64,
    ) -> Result<Vec<notifications::Model>, Error>;

    /// Not found when `id` does not exist or belongs to someone else.
    async fn mark_read(&self, id: Id, recipient_id: Id) -> Result<(), Error>;

    async fn mark_all_read(&self, recipient_id: Id) -> Result<u64, Error>;

    async fn unread_count(&self, recipient_id: Id) -> Result<u64, Error>;

    /// Whether the same actor already produced this kind of notification for
    /// this recipient (and video, if any) within the trailing `window`.
    async fn exists_recent(
        &self,
        recipient_id: Id,
        actor_id: Id,
        notification_type: NotificationType,
        video_id: Option<Id>,
        window: Duration,
    ) -> Result<bool, Error>;

    /// Not found when `id` does not exist or belongs to someone else.
    async fn delete(&self, id: Id, recipient_id: Id) -> Result<(), Error>;
}

#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn actor_info(&self, actor_id: Id) -> Result<ActorInfo, Error>;
}

/// Start of a trailing window ending now. A window too large to represent
/// reaches back to the earliest representable time.
pub(crate) fn window_start(window: Duration) -> chrono::DateTime<chrono::Utc> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|window| chrono::Utc::now().checked_sub_signed(window))
        .unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC)
}
