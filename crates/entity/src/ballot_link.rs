use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Link recipient role; decides the query parameters on the delivered URL.
pub const ROLE_VOTER: &str = "voter";
pub const ROLE_CANDIDATE: &str = "candidate";

/// Single-use shareable ballot link, delivered by SMS.
///
/// Unlike an anonymous credential this row retains the fingerprint: the link
/// must support a downstream candidate claim that recognizes "this same
/// phone" without a second verification step.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ballot_links")]
pub struct Model {
    /// Unguessable 256-bit token (hex).
    #[sea_orm(primary_key, auto_increment = false)]
    pub token: String,

    pub fingerprint: String,

    /// Browser/device identifier that requested the link, when known.
    pub device_id: Option<String>,

    /// `voter` or `candidate`.
    pub role: String,

    pub used: bool,

    /// Unix timestamp (seconds).
    pub created_at: i64,

    /// Unix timestamp (seconds).
    pub expires_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
