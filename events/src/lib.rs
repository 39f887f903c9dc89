//! Application events that can produce notifications.
//!
//! The engagement, comment and follow flows publish these events once their
//! own work has succeeded; they never talk to the notification subsystem
//! directly.
//!
//! # Architecture
//!
//! - **DomainEvent**: Enum representing every user action worth notifying about
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates (entity, domain, etc.),
//! avoiding circular dependencies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A type alias that represents any Entity's internal id field data type.
/// This matches the definition in the entity crate to maintain compatibility.
pub type Id = Uuid;

/// User actions that may warrant a notification.
///
/// Whether one is actually created (self-actions, repeats) is decided by the
/// handler, not by the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A user liked a video.
    VideoLiked {
        video_id: Id,
        video_owner_id: Id,
        liked_by: Id,
    },
    /// A user commented on a video.
    VideoCommented {
        video_id: Id,
        video_owner_id: Id,
        comment_id: Id,
        commented_by: Id,
        /// Full comment body; shortened when it becomes notification text.
        body: String,
    },
    /// A user started following another user.
    UserFollowed { followed_id: Id, follower_id: Id },
    /// A user was @-mentioned in a comment.
    UserMentioned {
        mentioned_id: Id,
        mentioned_by: Id,
        video_id: Id,
        comment_id: Id,
    },
}

/// Trait for handling domain events.
/// Implementations can perform side effects like sending notifications,
/// updating caches, logging, etc.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    /// Publish an event to all registered handlers and wait for them.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }

    /// Publish without making the caller wait. The request that produced the
    /// event should not be slowed down by notification delivery.
    pub fn publish_detached(&self, event: DomainEvent) {
        let publisher = self.clone();
        tokio::spawn(async move {
            publisher.publish(event).await;
        });
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
