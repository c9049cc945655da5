use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use entity::ballot_link::{self, ROLE_CANDIDATE, ROLE_VOTER};
use entity::phone_suppression::SCOPE_CONTACT;
use entity::vote::SOURCE_BALLOT;
use entity::BallotLink;

use crate::config::{
    Config, BALLOT_LINK_TTL_SECS, GLOBAL_KEY, RATE_BALLOT_GLOBAL, RATE_BALLOT_PHONE,
};
use crate::device_slots::{self, SlotStore};
use crate::error::VoteError;
use crate::notify::{ballot_link_sms, SmsSender};
use crate::ratelimit::{self, CounterStore};
use crate::screen::{LineType, PhoneTypeScreen};
use crate::util::{generate_link_token, now_ts};
use crate::{ledger, phone, suppress};

/// Status probe result for a ballot link landing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BallotStatus {
    Valid { role: String },
    Used,
    Expired,
    NotFound,
    AlreadyVoted,
}

impl BallotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BallotStatus::Valid { .. } => "valid",
            BallotStatus::Used => "used",
            BallotStatus::Expired => "expired",
            BallotStatus::NotFound => "not_found",
            BallotStatus::AlreadyVoted => "already_voted",
        }
    }
}

/// Create a single-use ballot link for `phone_number` and deliver it by SMS.
///
/// This path deliberately keys the eventual vote by fingerprint (unlike the
/// interactive credential flow) so the link can be idempotency-checked up
/// front and can carry a later candidate claim. Every gate (suppression,
/// already-voted, rate limits, line-type screen, device slots) runs before
/// the row exists or an SMS leaves.
pub async fn send_ballot_link(
    db: &DatabaseConnection,
    counters: &impl CounterStore,
    screen: &impl PhoneTypeScreen,
    slots: &impl SlotStore,
    sms: &impl SmsSender,
    config: &Config,
    dial_code: &str,
    phone_number: &str,
    device_id: Option<&str>,
    role: &str,
) -> Result<(), VoteError> {
    if role != ROLE_VOTER && role != ROLE_CANDIDATE {
        return Err(VoteError::Validation("unknown ballot role"));
    }

    let e164 = phone::normalize_e164(dial_code, phone_number)?;
    let fingerprint = phone::fingerprint(&config.fingerprint_salt, &e164);

    if suppress::is_suppressed(db, &fingerprint, SCOPE_CONTACT).await? {
        return Err(VoteError::Suppressed);
    }

    // Early idempotency check; a phone that already voted gets a terminal
    // answer instead of a dead link.
    if ledger::has_voted(db, &fingerprint).await? {
        return Err(VoteError::AlreadyVoted);
    }

    let now = now_ts();
    ratelimit::enforce(counters, &RATE_BALLOT_PHONE, &fingerprint, now).await?;
    ratelimit::enforce(counters, &RATE_BALLOT_GLOBAL, GLOBAL_KEY, now).await?;

    // Defense in depth: lookup errors fall through as Unknown.
    let line = screen.classify(&e164).await.unwrap_or(LineType::Unknown);
    if matches!(line, LineType::Voip | LineType::Landline) {
        return Err(VoteError::NonMobileNumber);
    }

    let token = generate_link_token();

    if let Some(device) = device_id {
        device_slots::reserve(slots, device, &token, now).await?;
    }

    let link = ballot_link::ActiveModel {
        token: Set(token.clone()),
        fingerprint: Set(fingerprint),
        device_id: Set(device_id.map(|d| d.to_string())),
        role: Set(role.to_string()),
        used: Set(false),
        created_at: Set(now),
        expires_at: Set(now + BALLOT_LINK_TTL_SECS),
    };
    link.insert(db).await?;

    sms.send_sms(&e164, &ballot_link_sms(&config.ballot_base_url, &token, role))
        .await?;

    Ok(())
}

/// Read-only status probe used by the landing page before it auto-submits.
pub async fn check_ballot_link(
    db: &DatabaseConnection,
    token: &str,
) -> Result<BallotStatus, VoteError> {
    let Some(link) = BallotLink::find_by_id(token.to_string()).one(db).await? else {
        return Ok(BallotStatus::NotFound);
    };

    if link.used {
        return Ok(BallotStatus::Used);
    }
    if link.expires_at <= now_ts() {
        return Ok(BallotStatus::Expired);
    }
    if ledger::has_voted(db, &link.fingerprint).await? {
        return Ok(BallotStatus::AlreadyVoted);
    }

    Ok(BallotStatus::Valid { role: link.role })
}

/// Redeem a link: burn it, record the fingerprint-keyed vote, free the slot.
///
/// Expired and used links are terminal and mutate nothing. The conditional
/// flip of `used` arbitrates concurrent redemptions of the same token; the
/// loser sees `LinkUsed`.
pub async fn redeem_ballot_link(
    db: &DatabaseConnection,
    slots: &impl SlotStore,
    token: &str,
    value: bool,
) -> Result<(), VoteError> {
    let now = now_ts();

    let Some(link) = BallotLink::find_by_id(token.to_string()).one(db).await? else {
        return Err(VoteError::LinkNotFound);
    };
    if link.used {
        return Err(VoteError::LinkUsed);
    }
    if link.expires_at <= now {
        return Err(VoteError::LinkExpired);
    }

    let flipped = BallotLink::update_many()
        .col_expr(ballot_link::Column::Used, Expr::value(true))
        .filter(ballot_link::Column::Token.eq(&link.token))
        .filter(ballot_link::Column::Used.eq(false))
        .exec(db)
        .await?;
    if flipped.rows_affected == 0 {
        return Err(VoteError::LinkUsed);
    }

    // The link is burned even when the fingerprint turns out to have voted
    // already: leaving it pending would invite retries that cannot succeed.
    let vote_result = ledger::insert_vote(db, &link.fingerprint, value, SOURCE_BALLOT, now).await;

    if let Some(device) = link.device_id.as_deref() {
        device_slots::release(slots, device, &link.token, now).await;
    }

    vote_result
}

/// Resolve a link token to its retained fingerprint.
///
/// Used as the fingerprint-bearing proof for candidate claims and opt-out;
/// spent links stay resolvable because the claim happens after redemption.
pub async fn link_fingerprint(
    db: &DatabaseConnection,
    token: &str,
) -> Result<String, VoteError> {
    let Some(link) = BallotLink::find_by_id(token.to_string()).one(db).await? else {
        return Err(VoteError::LinkNotFound);
    };
    Ok(link.fingerprint)
}
