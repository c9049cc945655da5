use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const STATUS_UNCLAIMED: i32 = 0;
pub const STATUS_CLAIMED: i32 = 1;
pub const STATUS_VERIFIED: i32 = 2;

/// Public candidate directory entry.
///
/// Created by seeding or self-registration. Claimed exactly once: the claim
/// is a conditional update on `fingerprint IS NULL`, never read-then-write.
/// Verification (status 2) is an admin action outside this service.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "candidates")]
pub struct Model {
    /// Random row id (hex).
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    pub region: Option<String>,

    /// Set when claimed; NULL while the entry is open.
    pub fingerprint: Option<String>,

    /// Contact number kept for admin verification, E.164.
    pub contact_phone: Option<String>,

    /// 0 unclaimed, 1 claimed, 2 verified.
    pub status: i32,

    /// Unix timestamp (seconds).
    pub created_at: i64,

    /// Unix timestamp (seconds).
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
