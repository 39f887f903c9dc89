//! Turns user actions into persisted, enriched and delivered notifications,
//! and serves the recipient-facing read path.

use crate::error::Error;
use crate::notification_type::NotificationType;
use crate::payload::{ActorInfo, NotificationPage, NotificationPayload};
use crate::store::{NotificationStore, UserLookup};
use crate::{notifications, Id};
use chrono::Utc;
use hub::Hub;
use log::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const COMMENT_PREVIEW_CHARS: usize = 50;

/// Tunables for creation and listing.
#[derive(Debug, Clone)]
pub struct NotificationPolicy {
    /// A repeat of the same (recipient, actor, type, video) inside this
    /// trailing window is dropped.
    pub dedup_window: Duration,
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            dedup_window: Duration::from_secs(24 * 60 * 60),
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// A notification that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient_id: Id,
    pub notification_type: NotificationType,
    pub actor_id: Id,
    pub video_id: Option<Id>,
    pub comment_id: Option<Id>,
    pub text: String,
}

impl From<NewNotification> for notifications::Model {
    fn from(new: NewNotification) -> Self {
        notifications::Model {
            // Assigned by the store.
            id: Id::nil(),
            recipient_id: new.recipient_id,
            notification_type: new.notification_type,
            actor_id: new.actor_id,
            video_id: new.video_id,
            comment_id: new.comment_id,
            text: new.text,
            read: false,
            created_at: Utc::now().into(),
        }
    }
}

pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    users: Arc<dyn UserLookup>,
    hub: Hub,
    policy: NotificationPolicy,
}

impl NotificationService {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        users: Arc<dyn UserLookup>,
        hub: Hub,
        policy: NotificationPolicy,
    ) -> Self {
        Self {
            store,
            users,
            hub,
            policy,
        }
    }

    /// Create a notification and push it to every live session of its
    /// recipient. Returns the delivered payload, or `None` when the
    /// notification was suppressed as a self-action or a recent duplicate.
    ///
    /// Only a failure to persist is reported. Enrichment and delivery are
    /// best effort.
    pub async fn notify(
        &self,
        notification: NewNotification,
    ) -> Result<Option<NotificationPayload>, Error> {
        let recipient_id = notification.recipient_id;
        let notification_type = notification.notification_type;

        if notification_type.suppresses_self_action() && notification.actor_id == recipient_id {
            debug!("Skipping {notification_type} notification: user {recipient_id} acted on their own content");
            return Ok(None);
        }

        match self
            .store
            .exists_recent(
                recipient_id,
                notification.actor_id,
                notification_type,
                notification.video_id,
                self.policy.dedup_window,
            )
            .await
        {
            Ok(true) => {
                debug!(
                    "Skipping duplicate {notification_type} notification from {} to {recipient_id}",
                    notification.actor_id
                );
                return Ok(None);
            }
            Ok(false) => {}
            Err(e) => warn!("Duplicate check failed, creating notification anyway: {e}"),
        }

        let created = self.store.create(notification.into()).await?;
        info!(
            "Created {notification_type} notification {} for user {recipient_id}",
            created.id
        );

        let actor = self.actor(created.actor_id).await;
        let payload = NotificationPayload::new(created, actor);

        match serde_json::to_string(&payload) {
            Ok(json) => self.hub.broadcast(recipient_id, json).await,
            Err(e) => error!("Failed to serialize notification {}: {e}", payload.id),
        }

        Ok(Some(payload))
    }

    pub async fn notify_like(
        &self,
        video_owner_id: Id,
        actor_id: Id,
        video_id: Id,
    ) -> Result<Option<NotificationPayload>, Error> {
        self.notify(NewNotification {
            recipient_id: video_owner_id,
            notification_type: NotificationType::Like,
            actor_id,
            video_id: Some(video_id),
            comment_id: None,
            text: "liked your video".to_string(),
        })
        .await
    }

    pub async fn notify_comment(
        &self,
        video_owner_id: Id,
        actor_id: Id,
        video_id: Id,
        comment_id: Id,
        body: &str,
    ) -> Result<Option<NotificationPayload>, Error> {
        self.notify(NewNotification {
            recipient_id: video_owner_id,
            notification_type: NotificationType::Comment,
            actor_id,
            video_id: Some(video_id),
            comment_id: Some(comment_id),
            text: format!("commented: {}", comment_preview(body)),
        })
        .await
    }

    pub async fn notify_follow(
        &self,
        followed_id: Id,
        follower_id: Id,
    ) -> Result<Option<NotificationPayload>, Error> {
        self.notify(NewNotification {
            recipient_id: followed_id,
            notification_type: NotificationType::Follow,
            actor_id: follower_id,
            video_id: None,
            comment_id: None,
            text: "started following you".to_string(),
        })
        .await
    }

    pub async fn notify_mention(
        &self,
        mentioned_id: Id,
        actor_id: Id,
        video_id: Id,
        comment_id: Id,
    ) -> Result<Option<NotificationPayload>, Error> {
        self.notify(NewNotification {
            recipient_id: mentioned_id,
            notification_type: NotificationType::Mention,
            actor_id,
            video_id: Some(video_id),
            comment_id: Some(comment_id),
            text: "mentioned you in a comment".to_string(),
        })
        .await
    }

    /// A page of the recipient's notifications, newest first. `cursor` is the
    /// `next_cursor` of the previous page.
    pub async fn list(
        &self,
        recipient_id: Id,
        cursor: Option<Id>,
        limit: Option<u64>,
    ) -> Result<NotificationPage, Error> {
        let limit = limit.unwrap_or(self.policy.default_page_size);
        if limit == 0 || limit > self.policy.max_page_size {
            return Err(Error::validation(format!(
                "limit must be between 1 and {}",
                self.policy.max_page_size
            )));
        }

        // One extra row tells us whether another page exists.
        let mut rows = self
            .store
            .list_by_recipient(recipient_id, cursor, limit + 1)
            .await?;
        let has_more = rows.len() as u64 > limit;
        rows.truncate(limit as usize);
        let next_cursor = if has_more {
            rows.last().map(|n| n.id)
        } else {
            None
        };

        let mut actors: HashMap<Id, Option<ActorInfo>> = HashMap::new();
        let mut notifications = Vec::with_capacity(rows.len());
        for row in rows {
            let actor = match actors.get(&row.actor_id) {
                Some(actor) => actor.clone(),
                None => {
                    let actor = self.actor(row.actor_id).await;
                    actors.insert(row.actor_id, actor.clone());
                    actor
                }
            };
            notifications.push(NotificationPayload::new(row, actor));
        }

        Ok(NotificationPage {
            notifications,
            unread_count: self.store.unread_count(recipient_id).await?,
            has_more,
            next_cursor,
        })
    }

    /// Idempotent. Not found when the notification belongs to someone else.
    pub async fn mark_read(&self, id: Id, recipient_id: Id) -> Result<(), Error> {
        self.store.mark_read(id, recipient_id).await?;
        debug!("User {recipient_id} marked notification {id} read");
        Ok(())
    }

    pub async fn mark_all_read(&self, recipient_id: Id) -> Result<u64, Error> {
        let changed = self.store.mark_all_read(recipient_id).await?;
        debug!("User {recipient_id} marked {changed} notification(s) read");
        Ok(changed)
    }

    pub async fn unread_count(&self, recipient_id: Id) -> Result<u64, Error> {
        self.store.unread_count(recipient_id).await
    }

    pub async fn delete(&self, id: Id, recipient_id: Id) -> Result<(), Error> {
        self.store.delete(id, recipient_id).await?;
        info!("User {recipient_id} deleted notification {id}");
        Ok(())
    }

    async fn actor(&self, actor_id: Id) -> Option<ActorInfo> {
        match self.users.actor_info(actor_id).await {
            Ok(actor) => Some(actor),
            Err(e) => {
                warn!("Could not look up actor {actor_id}, sending without actor details: {e}");
                None
            }
        }
    }
}

/// The first characters of a comment, with an ellipsis when anything was cut.
fn comment_preview(body: &str) -> String {
    match body.char_indices().nth(COMMENT_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
