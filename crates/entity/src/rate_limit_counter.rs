use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sliding-window abuse counter.
///
/// Ephemeral and reconstructible; an abuse brake, not a source of truth.
/// Incremented with a single atomic upsert, never read-then-write.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "rate_limit_counters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub bucket: String,

    #[sea_orm(primary_key, auto_increment = false)]
    pub counter_key: String,

    pub hits: i32,

    /// Unix timestamp (seconds).
    pub window_reset_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
