use super::error::Error;
use chrono::{DateTime, Utc};
use entity::notification_type::NotificationType;
use entity::notifications::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*, sea_query::Expr, ActiveValue::Set, ConnectionTrait, QueryOrder,
    QuerySelect,
};

/// Insert a new notification. The id, creation time and read flag are
/// assigned here regardless of what the caller passed in.
pub async fn create(db: &impl ConnectionTrait, notification_model: Model) -> Result<Model, Error> {
    debug!("New Notification Model to be inserted: {notification_model:?}");

    let active_model = ActiveModel {
        id: Set(entity::new_ordered_id()),
        recipient_id: Set(notification_model.recipient_id),
        notification_type: Set(notification_model.notification_type),
        actor_id: Set(notification_model.actor_id),
        video_id: Set(notification_model.video_id),
        comment_id: Set(notification_model.comment_id),
        text: Set(notification_model.text),
        read: Set(false),
        created_at: Set(Utc::now().into()),
    };

    Ok(active_model.insert(db).await?)
}

/// A page of a recipient's notifications, newest first. `cursor` is the id of
/// the last notification the caller has already seen.
pub async fn find_by_recipient(
    db: &impl ConnectionTrait,
    recipient_id: Id,
    cursor: Option<Id>,
    limit: u64,
) -> Result<Vec<Model>, Error> {
    let mut query = Entity::find().filter(Column::RecipientId.eq(recipient_id));

    if let Some(cursor) = cursor {
        query = query.filter(Column::Id.lt(cursor));
    }

    Ok(query
        .order_by_desc(Column::Id)
        .limit(limit)
        .all(db)
        .await?)
}

/// Mark one notification read. Matching on both id and recipient means a
/// notification owned by someone else is reported as not found.
pub async fn mark_read(db: &impl ConnectionTrait, id: Id, recipient_id: Id) -> Result<(), Error> {
    let result = Entity::update_many()
        .col_expr(Column::Read, Expr::value(true))
        .filter(Column::Id.eq(id))
        .filter(Column::RecipientId.eq(recipient_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        warn!("Notification {id} not found for user {recipient_id}");
        return Err(Error::not_found());
    }

    Ok(())
}

/// Mark every unread notification of a recipient read, returning how many
/// changed.
pub async fn mark_all_read(db: &impl ConnectionTrait, recipient_id: Id) -> Result<u64, Error> {
    let result = Entity::update_many()
        .col_expr(Column::Read, Expr::value(true))
        .filter(Column::RecipientId.eq(recipient_id))
        .filter(Column::Read.eq(false))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

pub async fn unread_count(db: &impl ConnectionTrait, recipient_id: Id) -> Result<u64, Error> {
    Ok(Entity::find()
        .filter(Column::RecipientId.eq(recipient_id))
        .filter(Column::Read.eq(false))
        .count(db)
        .await?)
}

/// Whether an equivalent notification was created at or after `since`.
/// Without a video the match ignores the video column entirely.
pub async fn exists_since(
    db: &impl ConnectionTrait,
    recipient_id: Id,
    actor_id: Id,
    notification_type: NotificationType,
    video_id: Option<Id>,
    since: DateTime<Utc>,
) -> Result<bool, Error> {
    let mut query = Entity::find()
        .filter(Column::RecipientId.eq(recipient_id))
        .filter(Column::ActorId.eq(actor_id))
        .filter(Column::NotificationType.eq(notification_type))
        .filter(Column::CreatedAt.gte(since));

    if let Some(video_id) = video_id {
        query = query.filter(Column::VideoId.eq(video_id));
    }

    Ok(query.count(db).await? > 0)
}

pub async fn delete(db: &impl ConnectionTrait, id: Id, recipient_id: Id) -> Result<(), Error> {
    let result = Entity::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::RecipientId.eq(recipient_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        warn!("Notification {id} not found for user {recipient_id}, nothing deleted");
        return Err(Error::not_found());
    }

    Ok(())
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::error::EntityApiErrorKind;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn notification_model(recipient_id: Id) -> Model {
        Model {
            id: entity::new_ordered_id(),
            recipient_id,
            notification_type: NotificationType::Like,
            actor_id: Id::new_v4(),
            video_id: Some(Id::new_v4()),
            comment_id: None,
            text: "liked your video".to_owned(),
            read: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn create_returns_a_new_notification_model() -> Result<(), Error> {
        let notification_model = notification_model(Id::new_v4());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![notification_model.clone()]])
            .into_connection();

        let notification = create(&db, notification_model.clone()).await?;

        assert_eq!(notification.id, notification_model.id);
        assert!(!notification.read);

        Ok(())
    }

    #[tokio::test]
    async fn find_by_recipient_returns_all_rows_from_the_query() -> Result<(), Error> {
        let recipient_id = Id::new_v4();
        let newer = notification_model(recipient_id);
        let older = notification_model(recipient_id);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![newer.clone(), older.clone()]])
            .into_connection();

        let notifications = find_by_recipient(&db, recipient_id, Some(Id::now_v7()), 2).await?;

        assert_eq!(notifications, vec![newer, older]);

        Ok(())
    }

    #[tokio::test]
    async fn mark_read_succeeds_when_a_row_matches() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        mark_read(&db, Id::new_v4(), Id::new_v4()).await?;

        Ok(())
    }

    #[tokio::test]
    async fn mark_read_returns_not_found_when_no_row_matches() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let result = mark_read(&db, Id::new_v4(), Id::new_v4()).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }

    #[tokio::test]
    async fn mark_all_read_reports_rows_changed() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            }])
            .into_connection();

        assert_eq!(mark_all_read(&db, Id::new_v4()).await?, 3);

        Ok(())
    }

    #[tokio::test]
    async fn delete_returns_not_found_when_no_row_matches() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let result = delete(&db, Id::new_v4(), Id::new_v4()).await;

        assert!(result.is_err());
    }
}
