use sea_orm::{DatabaseConnection, EntityTrait, Set, SqlErr};

use entity::vote::{self, SOURCE_CREDENTIAL};
use entity::Vote;

use crate::config::Config;
use crate::error::VoteError;
use crate::token;
use crate::util::now_ts;

/// Cast the vote a signed anonymous credential is good for.
///
/// The credential is validated offline; the insert keyed by its opaque id is
/// the sole double-vote check. A unique violation from the driver is the
/// expected signal for a repeat, translated rather than treated as internal.
pub async fn cast_vote(
    db: &DatabaseConnection,
    config: &Config,
    credential: &str,
    value: bool,
) -> Result<(), VoteError> {
    let now = now_ts();
    let opaque_id = token::validate(config.credential_secret.as_bytes(), credential, now)?;
    insert_vote(db, &opaque_id, value, SOURCE_CREDENTIAL, now).await
}

/// Insert a vote row. No pre-check: the primary key does the arbitration.
pub(crate) async fn insert_vote(
    db: &DatabaseConnection,
    identifier: &str,
    value: bool,
    source: &str,
    now: i64,
) -> Result<(), VoteError> {
    let row = vote::ActiveModel {
        identifier: Set(identifier.to_string()),
        value: Set(value),
        source: Set(source.to_string()),
        created_at: Set(now),
    };

    match Vote::insert(row).exec_without_returning(db).await {
        Ok(_) => Ok(()),
        Err(e) => match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Err(VoteError::AlreadyVoted),
            _ => Err(e.into()),
        },
    }
}

/// Ballot-path idempotency probe: has this identifier voted already?
pub async fn has_voted(db: &DatabaseConnection, identifier: &str) -> Result<bool, VoteError> {
    let found = Vote::find_by_id(identifier.to_string()).one(db).await?;
    Ok(found.is_some())
}
