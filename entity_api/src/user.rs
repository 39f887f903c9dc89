use super::error::Error;
use entity::users::{ActiveModel, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ActiveValue::Set, ConnectionTrait};

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| {
        debug!("User {id} not found");
        Error::not_found()
    })
}

pub async fn create(db: &impl ConnectionTrait, user_model: Model) -> Result<Model, Error> {
    debug!("New User Model to be inserted: {user_model:?}");

    let active_model = ActiveModel {
        id: Set(user_model.id),
        username: Set(user_model.username),
        display_name: Set(user_model.display_name),
        avatar_url: Set(user_model.avatar_url),
    };

    Ok(active_model.insert(db).await?)
}
