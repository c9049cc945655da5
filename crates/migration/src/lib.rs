pub use sea_orm_migration::prelude::*;

mod m20260805_000001_verification_tables;
mod m20260805_000002_votes;
mod m20260805_000003_ballot_links;
mod m20260806_000004_candidates;
mod m20260806_000005_suppressions_and_counters;

pub struct Migrator;

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260805_000001_verification_tables::Migration),
            Box::new(m20260805_000002_votes::Migration),
            Box::new(m20260805_000003_ballot_links::Migration),
            Box::new(m20260806_000004_candidates::Migration),
            Box::new(m20260806_000005_suppressions_and_counters::Migration),
        ]
    }
}
