use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Suppression scopes. `all` covers every automated contact and auto-claim.
pub const SCOPE_ALL: &str = "all";
pub const SCOPE_CONTACT: &str = "contact";
pub const SCOPE_CLAIM: &str = "claim";

/// Permanent opt-out marker.
///
/// Append-only: rows are inserted with on-conflict-do-nothing and there is no
/// user-facing removal.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "phone_suppressions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub fingerprint: String,

    #[sea_orm(primary_key, auto_increment = false)]
    pub scope: String,

    pub reason: Option<String>,

    /// Unix timestamp (seconds).
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
