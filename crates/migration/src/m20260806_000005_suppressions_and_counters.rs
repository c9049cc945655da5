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
                    .table(PhoneSuppressions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PhoneSuppressions::Fingerprint).string().not_null())
                    .col(ColumnDef::new(PhoneSuppressions::Scope).string().not_null())
                    .col(ColumnDef::new(PhoneSuppressions::Reason).string())
                    .col(
                        ColumnDef::new(PhoneSuppressions::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(PhoneSuppressions::Fingerprint)
                            .col(PhoneSuppressions::Scope),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RateLimitCounters::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RateLimitCounters::Bucket).string().not_null())
                    .col(ColumnDef::new(RateLimitCounters::CounterKey).string().not_null())
                    .col(
                        ColumnDef::new(RateLimitCounters::Hits)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RateLimitCounters::WindowResetAt)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(RateLimitCounters::Bucket)
                            .col(RateLimitCounters::CounterKey),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PhoneSuppressions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(RateLimitCounters::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PhoneSuppressions {
    Table,
    Fingerprint,
    Scope,
    Reason,
    CreatedAt,
}

#[derive(DeriveIden)]
enum RateLimitCounters {
    Table,
    Bucket,
    CounterKey,
    Hits,
    WindowResetAt,
}
