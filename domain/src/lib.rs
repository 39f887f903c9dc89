//! Notification business logic.
//!
//! Consumers of the `domain` crate should not need to depend on `entity_api`
//! directly, so the entity types used in this crate's API are re-exported
//! here.
pub use entity_api::{notification_type, notifications, users, Id};

pub mod error;
pub mod event_handler;
pub mod notification;
pub mod payload;
pub mod store;
