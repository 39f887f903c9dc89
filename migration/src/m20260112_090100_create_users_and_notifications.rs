use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE TYPE notify_hub.notification_type AS ENUM ('like', 'comment', 'follow', 'mention');",
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table((Alias::new("notify_hub"), Users::Table))
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Username).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::DisplayName).string().not_null())
                    .col(
                        ColumnDef::new(Users::AvatarUrl)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table((Alias::new("notify_hub"), Notifications::Table))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::RecipientId).uuid().not_null())
                    .col(
                        ColumnDef::new(Notifications::Type)
                            .custom(Alias::new("notify_hub.notification_type"))
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notifications::ActorId).uuid().not_null())
                    .col(ColumnDef::new(Notifications::VideoId).uuid().null())
                    .col(ColumnDef::new(Notifications::CommentId).uuid().null())
                    .col(ColumnDef::new(Notifications::Text).text().not_null())
                    .col(
                        ColumnDef::new(Notifications::Read)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("notifications_actor_id_fkey")
                            .from(
                                (Alias::new("notify_hub"), Notifications::Table),
                                Notifications::ActorId,
                            )
                            .to((Alias::new("notify_hub"), Users::Table), Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Newest-first listing per recipient
        manager
            .create_index(
                Index::create()
                    .name("notifications_recipient_id_id")
                    .table((Alias::new("notify_hub"), Notifications::Table))
                    .col(Notifications::RecipientId)
                    .col(Notifications::Id)
                    .to_owned(),
            )
            .await?;

        // Unread counts
        manager
            .create_index(
                Index::create()
                    .name("notifications_recipient_id_read")
                    .table((Alias::new("notify_hub"), Notifications::Table))
                    .col(Notifications::RecipientId)
                    .col(Notifications::Read)
                    .to_owned(),
            )
            .await?;

        // Duplicate suppression lookups
        manager
            .create_index(
                Index::create()
                    .name("notifications_recipient_actor_type_created_at")
                    .table((Alias::new("notify_hub"), Notifications::Table))
                    .col(Notifications::RecipientId)
                    .col(Notifications::ActorId)
                    .col(Notifications::Type)
                    .col(Notifications::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table((Alias::new("notify_hub"), Notifications::Table))
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .table((Alias::new("notify_hub"), Users::Table))
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP TYPE IF EXISTS notify_hub.notification_type;")
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    DisplayName,
    AvatarUrl,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    RecipientId,
    Type,
    ActorId,
    VideoId,
    CommentId,
    Text,
    Read,
    CreatedAt,
}
