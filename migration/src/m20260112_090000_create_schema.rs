use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS notify_hub;")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("SET search_path TO notify_hub, public;")
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // CASCADE removes every object in the schema
        manager
            .get_connection()
            .execute_unprepared("DROP SCHEMA IF EXISTS notify_hub CASCADE;")
            .await?;

        Ok(())
    }
}
