//! The outward-facing shapes of a notification: what streaming clients
//! receive and what the list endpoint returns.

use crate::notification_type::NotificationType;
use crate::{notifications, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Public profile of the user who triggered a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ActorInfo {
    #[schema(value_type = Uuid)]
    pub id: Id,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
}

impl From<entity_api::users::Model> for ActorInfo {
    fn from(user: entity_api::users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
        }
    }
}

/// A notification enriched with its actor, as pushed over a stream and
/// returned from the read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotificationPayload {
    #[schema(value_type = Uuid)]
    pub id: Id,
    #[schema(value_type = Uuid)]
    pub recipient_id: Id,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[schema(value_type = Uuid)]
    pub actor_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Uuid>)]
    pub video_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Uuid>)]
    pub comment_id: Option<Id>,
    pub text: String,
    pub read: bool,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    /// Absent when the actor's profile could not be looked up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<ActorInfo>,
}

impl NotificationPayload {
    pub fn new(notification: notifications::Model, actor: Option<ActorInfo>) -> Self {
        Self {
            id: notification.id,
            recipient_id: notification.recipient_id,
            notification_type: notification.notification_type,
            actor_id: notification.actor_id,
            video_id: notification.video_id,
            comment_id: notification.comment_id,
            text: notification.text,
            read: notification.read,
            created_at: notification.created_at.with_timezone(&Utc),
            actor,
        }
    }
}

/// One page of a recipient's notifications, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotificationPage {
    pub notifications: Vec<NotificationPayload>,
    pub unread_count: u64,
    pub has_more: bool,
    /// Pass back as `cursor` to fetch the next page. Only present when
    /// `has_more` is true.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Uuid>)]
    pub next_cursor: Option<Id>,
}
