use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use entity::phone_suppression::SCOPE_CONTACT;
use entity::sms_challenge;
use entity::{phone_verification, PhoneVerification, SmsChallenge};

use crate::captcha::CaptchaVerifier;
use crate::config::{
    Config, CREDENTIAL_TTL_SECS, GLOBAL_KEY, RATE_CONFIRM_PHONE, RATE_SMS_CODE_GLOBAL,
    RATE_SMS_CODE_PHONE, SMS_CODE_TTL_SECS, SMS_MAX_ATTEMPTS,
};
use crate::error::VoteError;
use crate::notify::{verification_code_sms, SmsSender};
use crate::ratelimit::{self, CounterStore};
use crate::util::{generate_opaque_id, generate_sms_code, now_ts};
use crate::{phone, suppress, token};

/// Issue a fresh one-time code to `phone` and deliver it by SMS.
///
/// Gate order is load-bearing: captcha and rate limits run before anything is
/// persisted or sent, so a rejected request never triggers a side effect.
/// Every request creates a new challenge; earlier ones stay in place and
/// simply lose authority to the newest.
pub async fn request_code(
    db: &DatabaseConnection,
    counters: &impl CounterStore,
    captcha: &impl CaptchaVerifier,
    sms: &impl SmsSender,
    config: &Config,
    dial_code: &str,
    phone_number: &str,
    captcha_token: &str,
) -> Result<(), VoteError> {
    let e164 = phone::normalize_e164(dial_code, phone_number)?;
    let fingerprint = phone::fingerprint(&config.fingerprint_salt, &e164);

    // Fail-closed: a captcha verifier outage blocks code issuance.
    if !captcha.verify(captcha_token).await? {
        return Err(VoteError::CaptchaFailed);
    }

    if suppress::is_suppressed(db, &fingerprint, SCOPE_CONTACT).await? {
        return Err(VoteError::Suppressed);
    }

    let now = now_ts();
    ratelimit::enforce(counters, &RATE_SMS_CODE_PHONE, &fingerprint, now).await?;
    ratelimit::enforce(counters, &RATE_SMS_CODE_GLOBAL, GLOBAL_KEY, now).await?;

    let code = generate_sms_code();
    let challenge = sms_challenge::ActiveModel {
        id: Set(generate_opaque_id()),
        fingerprint: Set(fingerprint),
        code: Set(code.clone()),
        attempts: Set(0),
        used: Set(false),
        created_at: Set(now),
        expires_at: Set(now + SMS_CODE_TTL_SECS),
    };
    challenge.insert(db).await?;

    sms.send_sms(&e164, &verification_code_sms(&code)).await?;

    Ok(())
}

/// Check a submitted code against the newest active challenge.
///
/// On success the challenge is spent, the fingerprint's verified-once record
/// is upserted, and a signed anonymous credential is returned. The credential
/// carries a fresh random identifier and nothing derived from the phone.
pub async fn confirm_code(
    db: &DatabaseConnection,
    counters: &impl CounterStore,
    config: &Config,
    dial_code: &str,
    phone_number: &str,
    code: &str,
) -> Result<String, VoteError> {
    let e164 = phone::normalize_e164(dial_code, phone_number)?;
    let fingerprint = phone::fingerprint(&config.fingerprint_salt, &e164);

    let now = now_ts();
    ratelimit::enforce(counters, &RATE_CONFIRM_PHONE, &fingerprint, now).await?;

    // Only the most recent unused, unexpired challenge is authoritative.
    let Some(challenge) = SmsChallenge::find()
        .filter(sms_challenge::Column::Fingerprint.eq(&fingerprint))
        .filter(sms_challenge::Column::Used.eq(false))
        .filter(sms_challenge::Column::ExpiresAt.gt(now))
        .order_by_desc(sms_challenge::Column::CreatedAt)
        .one(db)
        .await?
    else {
        return Err(VoteError::NoActiveChallenge);
    };

    if challenge.attempts >= SMS_MAX_ATTEMPTS {
        // Terminal. Burn the challenge so it is never consulted again.
        mark_used(db, &challenge.id).await?;
        return Err(VoteError::TooManyAttempts);
    }

    if !code_matches(code, &challenge.code) {
        // Atomic increment, not read-then-write: concurrent wrong guesses
        // must not under-count.
        SmsChallenge::update_many()
            .col_expr(
                sms_challenge::Column::Attempts,
                Expr::col(sms_challenge::Column::Attempts).add(1),
            )
            .filter(sms_challenge::Column::Id.eq(&challenge.id))
            .exec(db)
            .await?;

        let attempts_left = (SMS_MAX_ATTEMPTS - challenge.attempts - 1).max(0);
        return Err(VoteError::WrongCode { attempts_left });
    }

    mark_used(db, &challenge.id).await?;

    // Verified-at-least-once marker. Never consulted to detect prior voting;
    // that check belongs to the credential's single-use property at cast
    // time, which is what keeps phone and vote unlinked.
    let verified = phone_verification::ActiveModel {
        fingerprint: Set(fingerprint),
        created_at: Set(now),
        updated_at: Set(now),
    };
    PhoneVerification::insert(verified)
        .on_conflict(
            OnConflict::column(phone_verification::Column::Fingerprint)
                .update_column(phone_verification::Column::UpdatedAt)
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    token::issue(
        config.credential_secret.as_bytes(),
        &generate_opaque_id(),
        now,
        CREDENTIAL_TTL_SECS,
    )
}

async fn mark_used(db: &DatabaseConnection, challenge_id: &str) -> Result<(), VoteError> {
    SmsChallenge::update_many()
        .col_expr(sms_challenge::Column::Used, Expr::value(true))
        .filter(sms_challenge::Column::Id.eq(challenge_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Constant-time code comparison; length mismatch short-circuits, which leaks
/// nothing because the code length is public.
fn code_matches(supplied: &str, expected: &str) -> bool {
    let supplied = supplied.trim().as_bytes();
    let expected = expected.as_bytes();
    supplied.len() == expected.len()
        && bool::from(subtle::ConstantTimeEq::ct_eq(supplied, expected))
}
