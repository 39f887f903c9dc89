//! SeaORM Entity for the notifications table.

use crate::notification_type::NotificationType;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::notifications::Model)]
#[sea_orm(schema_name = "notify_hub", table_name = "notifications")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Id,

    /// The user the notification is addressed to
    #[schema(value_type = Uuid)]
    pub recipient_id: Id,

    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub notification_type: NotificationType,

    /// The user whose action triggered the notification
    #[schema(value_type = Uuid)]
    pub actor_id: Id,

    #[schema(value_type = Option<Uuid>)]
    pub video_id: Option<Id>,

    #[schema(value_type = Option<Uuid>)]
    pub comment_id: Option<Id>,

    #[sea_orm(column_type = "Text")]
    pub text: String,

    pub read: bool,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ActorId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Actor,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Actor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
