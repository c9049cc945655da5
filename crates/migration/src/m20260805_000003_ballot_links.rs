use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BallotLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BallotLinks::Token)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BallotLinks::Fingerprint).string().not_null())
                    .col(ColumnDef::new(BallotLinks::DeviceId).string())
                    .col(ColumnDef::new(BallotLinks::Role).string().not_null())
                    .col(
                        ColumnDef::new(BallotLinks::Used)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(BallotLinks::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BallotLinks::ExpiresAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ballot_links_fingerprint")
                    .table(BallotLinks::Table)
                    .col(BallotLinks::Fingerprint)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let _ = manager
            .drop_index(
                Index::drop()
                    .name("idx_ballot_links_fingerprint")
                    .to_owned(),
            )
            .await;

        manager
            .drop_table(Table::drop().table(BallotLinks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BallotLinks {
    Table,
    Token,
    Fingerprint,
    DeviceId,
    Role,
    Used,
    CreatedAt,
    ExpiresAt,
}
