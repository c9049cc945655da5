use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One-time SMS verification challenge.
///
/// A fingerprint may accumulate several rows (every code request creates a
/// fresh one); only the newest unused, unexpired row is authoritative when a
/// code is confirmed. Rows are never deleted, only marked used or left to
/// expire behind the query filter.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sms_challenges")]
pub struct Model {
    /// Random row id (hex).
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Salted one-way digest of the normalized phone number.
    pub fingerprint: String,

    /// Fixed-length numeric code delivered out of band.
    pub code: String,

    /// Failed confirm attempts consumed so far.
    pub attempts: i32,

    pub used: bool,

    /// Unix timestamp (seconds).
    pub created_at: i64,

    /// Unix timestamp (seconds).
    pub expires_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
