//! Create `network_strength` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NetworkStrength::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NetworkStrength::UserId)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(NetworkStrength::Strength)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(NetworkStrength::CalculatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_network_strength_user")
                            .from(NetworkStrength::Table, NetworkStrength::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (strength, user_id) for the leaderboard
        manager
            .create_index(
                Index::create()
                    .name("idx_network_strength_strength")
                    .table(NetworkStrength::Table)
                    .col((NetworkStrength::Strength, IndexOrder::Desc))
                    .col(NetworkStrength::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NetworkStrength::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum NetworkStrength {
    Table,
    UserId,
    Strength,
    CalculatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
