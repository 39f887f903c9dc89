use super::{window_start, NotificationStore, UserLookup};
use crate::error::Error;
use crate::notification_type::NotificationType;
use crate::payload::ActorInfo;
use crate::{notifications, Id};
use async_trait::async_trait;
use entity_api::{notification, user};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

/// Notifications and user profiles in PostgreSQL.
#[derive(Clone)]
pub struct DatabaseStore {
    db: Arc<DatabaseConnection>,
}

impl DatabaseStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }
}

#[async_trait]
impl NotificationStore for DatabaseStore {
    async fn create(
        &self,
        notification: notifications::Model,
    ) -> Result<notifications::Model, Error> {
        Ok(notification::create(self.db(), notification).await?)
    }

    async fn list_by_recipient(
        &self,
        recipient_id: Id,
        cursor: Option<Id>,
        limit: u64,
    ) -> Result<Vec<notifications::Model>, Error> {
        Ok(notification::find_by_recipient(self.db(), recipient_id, cursor, limit).await?)
    }

    async fn mark_read(&self, id: Id, recipient_id: Id) -> Result<(), Error> {
        Ok(notification::mark_read(self.db(), id, recipient_id).await?)
    }

    async fn mark_all_read(&self, recipient_id: Id) -> Result<u64, Error> {
        Ok(notification::mark_all_read(self.db(), recipient_id).await?)
    }

    async fn unread_count(&self, recipient_id: Id) -> Result<u64, Error> {
        Ok(notification::unread_count(self.db(), recipient_id).await?)
    }

    async fn exists_recent(
        &self,
        recipient_id: Id,
        actor_id: Id,
        notification_type: NotificationType,
        video_id: Option<Id>,
        window: Duration,
    ) -> Result<bool, Error> {
        Ok(notification::exists_since(
            self.db(),
            recipient_id,
            actor_id,
            notification_type,
            video_id,
            window_start(window),
        )
        .await?)
    }

    async fn delete(&self, id: Id, recipient_id: Id) -> Result<(), Error> {
        Ok(notification::delete(self.db(), id, recipient_id).await?)
    }
}

#[async_trait]
impl UserLookup for DatabaseStore {
    async fn actor_info(&self, actor_id: Id) -> Result<ActorInfo, Error> {
        Ok(user::find_by_id(self.db(), actor_id).await?.into())
    }
}
