use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Vote row provenance.
pub const SOURCE_CREDENTIAL: &str = "credential";
pub const SOURCE_BALLOT: &str = "ballot";

/// A cast stance.
///
/// `identifier` is either the opaque id of a spent anonymous credential
/// (interactive verify path, carries no phone linkage) or a phone fingerprint
/// (ballot link path, deliberately linked). The primary key doubles as the
/// at-most-one-vote constraint; a unique violation on insert is the expected
/// signal for a repeat vote.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "votes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub identifier: String,

    /// The yes/no stance.
    pub value: bool,

    /// `credential` or `ballot`.
    pub source: String,

    /// Unix timestamp (seconds).
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
