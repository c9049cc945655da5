use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Records that a fingerprint completed phone verification at least once.
///
/// Consulted to allow repeat verification without friction. Never joined to
/// votes: whether a phone has voted is decided solely by the credential's
/// single-use property at cast time.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "phone_verifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub fingerprint: String,

    /// Unix timestamp (seconds).
    pub created_at: i64,

    /// Unix timestamp (seconds).
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
