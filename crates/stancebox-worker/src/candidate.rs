use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use entity::candidate::{self, STATUS_CLAIMED};
use entity::phone_suppression::SCOPE_CLAIM;
use entity::Candidate;

use crate::error::VoteError;
use crate::util::{generate_opaque_id, now_ts};
use crate::{ledger, suppress};

const MAX_NAME_LEN: usize = 100;

/// Bind a voted fingerprint to an unclaimed directory entry.
///
/// The claim itself is one conditional update: set the fingerprint only where
/// it is still NULL. Zero affected rows means someone else won; reported as a
/// conflict, never retried. No read-then-write, no application lock.
pub async fn claim_candidate(
    db: &DatabaseConnection,
    candidate_id: &str,
    fingerprint: &str,
    contact_phone: Option<&str>,
) -> Result<(), VoteError> {
    if suppress::is_suppressed(db, fingerprint, SCOPE_CLAIM).await? {
        return Err(VoteError::Suppressed);
    }
    // Claiming before voting is rejected.
    if !ledger::has_voted(db, fingerprint).await? {
        return Err(VoteError::NotYetVoted);
    }

    // Existence is checked separately so an unknown id is not misreported as
    // a lost claim race.
    if Candidate::find_by_id(candidate_id.to_string())
        .one(db)
        .await?
        .is_none()
    {
        return Err(VoteError::Validation("unknown candidate"));
    }

    let claimed = Candidate::update_many()
        .col_expr(
            candidate::Column::Fingerprint,
            Expr::value(Some(fingerprint.to_string())),
        )
        .col_expr(
            candidate::Column::ContactPhone,
            Expr::value(contact_phone.map(|p| p.to_string())),
        )
        .col_expr(candidate::Column::Status, Expr::value(STATUS_CLAIMED))
        .col_expr(candidate::Column::UpdatedAt, Expr::value(now_ts()))
        .filter(candidate::Column::Id.eq(candidate_id))
        .filter(candidate::Column::Fingerprint.is_null())
        .exec(db)
        .await?;

    if claimed.rows_affected == 0 {
        return Err(VoteError::AlreadyClaimed);
    }

    Ok(())
}

/// Self-declared candidate: insert a fresh directory entry bound to the
/// fingerprint, pending admin verification.
///
/// Guarded by an exists-by-fingerprint probe rather than a constraint; the
/// TOCTOU window is accepted because a duplicate directory row is harmless,
/// unlike a duplicate vote or claim.
pub async fn register_candidate(
    db: &DatabaseConnection,
    fingerprint: &str,
    name: &str,
    region: Option<&str>,
    contact_phone: Option<&str>,
) -> Result<String, VoteError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(VoteError::Validation("candidate name cannot be blank"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(VoteError::Validation("candidate name too long"));
    }

    if suppress::is_suppressed(db, fingerprint, SCOPE_CLAIM).await? {
        return Err(VoteError::Suppressed);
    }
    if !ledger::has_voted(db, fingerprint).await? {
        return Err(VoteError::NotYetVoted);
    }

    let existing = Candidate::find()
        .filter(candidate::Column::Fingerprint.eq(fingerprint))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(VoteError::AlreadyRegistered);
    }

    let now = now_ts();
    let id = generate_opaque_id();
    let row = candidate::ActiveModel {
        id: Set(id.clone()),
        name: Set(name.to_string()),
        region: Set(region.map(|r| r.trim().to_string()).filter(|r| !r.is_empty())),
        fingerprint: Set(Some(fingerprint.to_string())),
        contact_phone: Set(contact_phone.map(|p| p.to_string())),
        status: Set(STATUS_CLAIMED),
        created_at: Set(now),
        updated_at: Set(now),
    };
    row.insert(db).await?;

    Ok(id)
}
