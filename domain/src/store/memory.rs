use super::{window_start, NotificationStore, UserLookup};
use crate::error::Error;
use crate::notification_type::NotificationType;
use crate::payload::ActorInfo;
use crate::{notifications, Id};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    /// Keyed by id; ids are time-ordered so the map order is creation order.
    notifications: BTreeMap<Id, notifications::Model>,
    users: HashMap<Id, ActorInfo>,
}

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a user known to actor lookups.
    pub async fn add_user(&self, actor: ActorInfo) {
        self.state.write().await.users.insert(actor.id, actor);
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create(
        &self,
        notification: notifications::Model,
    ) -> Result<notifications::Model, Error> {
        let model = notifications::Model {
            id: entity_api::new_ordered_id(),
            read: false,
            created_at: Utc::now().into(),
            ..notification
        };

        self.state
            .write()
            .await
            .notifications
            .insert(model.id, model.clone());
        Ok(model)
    }

    async fn list_by_recipient(
        &self,
        recipient_id: Id,
        cursor: Option<Id>,
        limit: u64,
    ) -> Result<Vec<notifications::Model>, Error> {
        let state = self.state.read().await;
        let older_than = match cursor {
            Some(cursor) => state.notifications.range(..cursor),
            None => state.notifications.range(..),
        };

        Ok(older_than
            .rev()
            .map(|(_, n)| n)
            .filter(|n| n.recipient_id == recipient_id)
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn mark_read(&self, id: Id, recipient_id: Id) -> Result<(), Error> {
        let mut state = self.state.write().await;
        match state.notifications.get_mut(&id) {
            Some(n) if n.recipient_id == recipient_id => {
                n.read = true;
                Ok(())
            }
            _ => Err(Error::not_found()),
        }
    }

    async fn mark_all_read(&self, recipient_id: Id) -> Result<u64, Error> {
        let mut state = self.state.write().await;
        let mut changed = 0;
        for n in state.notifications.values_mut() {
            if n.recipient_id == recipient_id && !n.read {
                n.read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn unread_count(&self, recipient_id: Id) -> Result<u64, Error> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .values()
            .filter(|n| n.recipient_id == recipient_id && !n.read)
            .count() as u64)
    }

    async fn exists_recent(
        &self,
        recipient_id: Id,
        actor_id: Id,
        notification_type: NotificationType,
        video_id: Option<Id>,
        window: Duration,
    ) -> Result<bool, Error> {
        let since = window_start(window);
        let state = self.state.read().await;
        Ok(state.notifications.values().any(|n| {
            n.recipient_id == recipient_id
                && n.actor_id == actor_id
                && n.notification_type == notification_type
                && (video_id.is_none() || n.video_id == video_id)
                && n.created_at >= since
        }))
    }

    async fn delete(&self, id: Id, recipient_id: Id) -> Result<(), Error> {
        let mut state = self.state.write().await;
        match state.notifications.get(&id) {
            Some(n) if n.recipient_id == recipient_id => {
                state.notifications.remove(&id);
                Ok(())
            }
            _ => Err(Error::not_found()),
        }
    }
}

#[async_trait]
impl UserLookup for MemoryStore {
    async fn actor_info(&self, actor_id: Id) -> Result<ActorInfo, Error> {
        self.state
            .read()
            .await
            .users
            .get(&actor_id)
            .cloned()
            .ok_or_else(Error::not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn like(recipient_id: Id, actor_id: Id, video_id: Id) -> notifications::Model {
        notifications::Model {
            id: Id::nil(),
            recipient_id,
            notification_type: NotificationType::Like,
            actor_id,
            video_id: Some(video_id),
            comment_id: None,
            text: "liked your video".to_string(),
            read: true,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn create_assigns_identity_and_unread() -> Result<(), Error> {
        let store = MemoryStore::new();

        let created = store
            .create(like(Id::new_v4(), Id::new_v4(), Id::new_v4()))
            .await?;

        assert_ne!(created.id, Id::nil());
        assert!(!created.read);
        Ok(())
    }

    #[tokio::test]
    async fn list_is_newest_first_and_scoped_to_the_recipient() -> Result<(), Error> {
        let store = MemoryStore::new();
        let recipient = Id::new_v4();
        let older = store.create(like(recipient, Id::new_v4(), Id::new_v4())).await?;
        store.create(like(Id::new_v4(), Id::new_v4(), Id::new_v4())).await?;
        let newer = store.create(like(recipient, Id::new_v4(), Id::new_v4())).await?;

        let page = store.list_by_recipient(recipient, None, 10).await?;
        assert_eq!(page, vec![newer.clone(), older.clone()]);

        let after_cursor = store.list_by_recipient(recipient, Some(newer.id), 10).await?;
        assert_eq!(after_cursor, vec![older]);
        Ok(())
    }

    #[tokio::test]
    async fn exists_recent_matches_on_video_only_when_given() -> Result<(), Error> {
        let store = MemoryStore::new();
        let (recipient, actor, video) = (Id::new_v4(), Id::new_v4(), Id::new_v4());
        store.create(like(recipient, actor, video)).await?;
        let day = Duration::from_secs(24 * 60 * 60);

        let same = store
            .exists_recent(recipient, actor, NotificationType::Like, Some(video), day)
            .await?;
        let other_video = store
            .exists_recent(recipient, actor, NotificationType::Like, Some(Id::new_v4()), day)
            .await?;
        let any_video = store
            .exists_recent(recipient, actor, NotificationType::Like, None, day)
            .await?;
        let other_type = store
            .exists_recent(recipient, actor, NotificationType::Comment, Some(video), day)
            .await?;

        assert!(same);
        assert!(!other_video);
        assert!(any_video);
        assert!(!other_type);
        Ok(())
    }

    #[tokio::test]
    async fn zero_window_sees_nothing_older_than_now() -> Result<(), Error> {
        let store = MemoryStore::new();
        let (recipient, actor, video) = (Id::new_v4(), Id::new_v4(), Id::new_v4());
        store.create(like(recipient, actor, video)).await?;
        tokio::time::sleep(Duration::from_millis(5)).await;

        let found = store
            .exists_recent(recipient, actor, NotificationType::Like, Some(video), Duration::ZERO)
            .await?;

        assert!(!found);
        Ok(())
    }

    #[tokio::test]
    async fn delete_requires_ownership() -> Result<(), Error> {
        let store = MemoryStore::new();
        let recipient = Id::new_v4();
        let created = store.create(like(recipient, Id::new_v4(), Id::new_v4())).await?;

        assert!(store.delete(created.id, Id::new_v4()).await.unwrap_err().is_not_found());
        store.delete(created.id, recipient).await?;
        assert!(store.list_by_recipient(recipient, None, 10).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_actor_is_not_found() {
        let store = MemoryStore::new();

        assert!(store.actor_info(Id::new_v4()).await.unwrap_err().is_not_found());
    }
}
