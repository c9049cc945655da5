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
                    .table(SmsChallenges::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SmsChallenges::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SmsChallenges::Fingerprint).string().not_null())
                    .col(ColumnDef::new(SmsChallenges::Code).string().not_null())
                    .col(
                        ColumnDef::new(SmsChallenges::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SmsChallenges::Used)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SmsChallenges::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SmsChallenges::ExpiresAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sms_challenges_fingerprint")
                    .table(SmsChallenges::Table)
                    .col(SmsChallenges::Fingerprint)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PhoneVerifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PhoneVerifications::Fingerprint)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PhoneVerifications::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PhoneVerifications::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let _ = manager
            .drop_index(
                Index::drop()
                    .name("idx_sms_challenges_fingerprint")
                    .to_owned(),
            )
            .await;

        manager
            .drop_table(Table::drop().table(SmsChallenges::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(PhoneVerifications::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SmsChallenges {
    Table,
    Id,
    Fingerprint,
    Code,
    Attempts,
    Used,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum PhoneVerifications {
    Table,
    Fingerprint,
    CreatedAt,
    UpdatedAt,
}
