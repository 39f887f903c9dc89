use crate::notification::NotificationService;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Creates a notification for every qualifying application event.
///
/// Publishers never learn about failures here; a notification that could not
/// be created is logged and dropped.
pub struct NotificationEventHandler {
    notifications: Arc<NotificationService>,
}

impl NotificationEventHandler {
    pub fn new(notifications: Arc<NotificationService>) -> Self {
        Self { notifications }
    }
}

#[async_trait]
impl EventHandler for NotificationEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        let result = match event {
            DomainEvent::VideoLiked {
                video_id,
                video_owner_id,
                liked_by,
            } => {
                self.notifications
                    .notify_like(*video_owner_id, *liked_by, *video_id)
                    .await
            }
            DomainEvent::VideoCommented {
                video_id,
                video_owner_id,
                comment_id,
                commented_by,
                body,
            } => {
                self.notifications
                    .notify_comment(*video_owner_id, *commented_by, *video_id, *comment_id, body)
                    .await
            }
            DomainEvent::UserFollowed {
                followed_id,
                follower_id,
            } => {
                self.notifications
                    .notify_follow(*followed_id, *follower_id)
                    .await
            }
            DomainEvent::UserMentioned {
                mentioned_id,
                mentioned_by,
                video_id,
                comment_id,
            } => {
                self.notifications
                    .notify_mention(*mentioned_id, *mentioned_by, *video_id, *comment_id)
                    .await
            }
        };

        match result {
            Ok(Some(payload)) => trace!("Event produced notification {}", payload.id),
            Ok(None) => trace!("Event suppressed: {event:?}"),
            Err(e) => error!("Failed to create notification for {event:?}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationPolicy;
    use crate::store::MemoryStore;
    use crate::Id;
    use events::EventPublisher;
    use hub::HubConfig;

    #[tokio::test]
    async fn published_events_become_notifications() {
        let (hub, dispatch) = hub::channel(&HubConfig::default());
        tokio::spawn(dispatch.run());
        let store = Arc::new(MemoryStore::new());
        let service = Arc::new(NotificationService::new(
            store.clone(),
            store.clone(),
            hub,
            NotificationPolicy::default(),
        ));
        let publisher = EventPublisher::new()
            .with_handler(Arc::new(NotificationEventHandler::new(service.clone())));
        let owner = Id::new_v4();

        publisher
            .publish(DomainEvent::VideoCommented {
                video_id: Id::new_v4(),
                video_owner_id: owner,
                comment_id: Id::new_v4(),
                commented_by: Id::new_v4(),
                body: "great edit".to_string(),
            })
            .await;
        publisher
            .publish(DomainEvent::UserMentioned {
                mentioned_id: owner,
                mentioned_by: Id::new_v4(),
                video_id: Id::new_v4(),
                comment_id: Id::new_v4(),
            })
            .await;

        let page = service.list(owner, None, None).await.unwrap();
        let texts: Vec<&str> = page.notifications.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["mentioned you in a comment", "commented: great edit"]
        );
    }

    #[tokio::test]
    async fn liking_your_own_video_is_ignored() {
        let (hub, dispatch) = hub::channel(&HubConfig::default());
        tokio::spawn(dispatch.run());
        let store = Arc::new(MemoryStore::new());
        let service = Arc::new(NotificationService::new(
            store.clone(),
            store,
            hub,
            NotificationPolicy::default(),
        ));
        let handler = NotificationEventHandler::new(service.clone());
        let owner = Id::new_v4();

        handler
            .handle(&DomainEvent::VideoLiked {
                video_id: Id::new_v4(),
                video_owner_id: owner,
                liked_by: owner,
            })
            .await;

        assert_eq!(service.unread_count(owner).await.unwrap(), 0);
    }
}
