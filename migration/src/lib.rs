pub use sea_orm_migration::prelude::*;

mod m20260112_090000_create_schema;
mod m20260112_090100_create_users_and_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260112_090000_create_schema::Migration),
            Box::new(m20260112_090100_create_users_and_notifications::Migration),
        ]
    }
}
