use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What kind of action produced a notification.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Hash, EnumIter, Deserialize, Serialize, DeriveActiveEnum, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "notification_type"
)]
pub enum NotificationType {
    #[sea_orm(string_value = "like")]
    Like,
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "follow")]
    Follow,
    #[sea_orm(string_value = "mention")]
    Mention,
}

impl NotificationType {
    /// Whether an actor acting on their own video should be ignored.
    /// Following yourself is rejected before it ever reaches us, and a
    /// self-mention is still delivered.
    pub fn suppresses_self_action(&self) -> bool {
        match self {
            NotificationType::Like | NotificationType::Comment => true,
            NotificationType::Follow | NotificationType::Mention => false,
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::Like => write!(fmt, "like"),
            NotificationType::Comment => write!(fmt, "comment"),
            NotificationType::Follow => write!(fmt, "follow"),
            NotificationType::Mention => write!(fmt, "mention"),
        }
    }
}
