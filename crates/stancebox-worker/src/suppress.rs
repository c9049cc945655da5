use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use entity::phone_suppression::{self, SCOPE_ALL};
use entity::PhoneSuppression;

use crate::error::VoteError;
use crate::util::now_ts;

/// Record a permanent opt-out for `fingerprint` under `scope`.
///
/// Idempotent: a second call with the same pair is a no-op, not an error.
/// There is no user-facing un-suppress.
pub async fn suppress(
    db: &DatabaseConnection,
    fingerprint: &str,
    scope: &str,
    reason: Option<&str>,
) -> Result<(), VoteError> {
    let row = phone_suppression::ActiveModel {
        fingerprint: Set(fingerprint.to_string()),
        scope: Set(scope.to_string()),
        reason: Set(reason.map(|r| r.to_string())),
        created_at: Set(now_ts()),
    };

    PhoneSuppression::insert(row)
        .on_conflict(
            OnConflict::columns([
                phone_suppression::Column::Fingerprint,
                phone_suppression::Column::Scope,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(())
}

/// Whether `fingerprint` opted out of `scope`. `all` covers every scope.
pub async fn is_suppressed(
    db: &DatabaseConnection,
    fingerprint: &str,
    scope: &str,
) -> Result<bool, VoteError> {
    let found = PhoneSuppression::find()
        .filter(phone_suppression::Column::Fingerprint.eq(fingerprint))
        .filter(phone_suppression::Column::Scope.is_in([scope, SCOPE_ALL]))
        .one(db)
        .await?;

    Ok(found.is_some())
}
