//! End-to-end protocol tests against in-memory SQLite with mock
//! collaborators. The Worker HTTP surface is wasm-only; everything under test
//! here is the platform-neutral core.

use std::collections::HashMap;
use std::sync::Mutex;

use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, Set};

use migration::{Migrator, MigratorTrait};

use entity::ballot_link::{ROLE_CANDIDATE, ROLE_VOTER};
use entity::phone_suppression::{SCOPE_ALL, SCOPE_CONTACT};
use entity::vote::SOURCE_BALLOT;
use entity::{
    ballot_link, candidate, phone_suppression, vote, BallotLink, PhoneSuppression, PhoneVerification,
    RateLimitCounter, Vote,
};

use stancebox_worker::ballot::{self, BallotStatus};
use stancebox_worker::candidate as candidates;
use stancebox_worker::captcha::CaptchaVerifier;
use stancebox_worker::config::{Config, RATE_SMS_CODE_PHONE};
use stancebox_worker::device_slots::SlotStore;
use stancebox_worker::error::VoteError;
use stancebox_worker::notify::SmsSender;
use stancebox_worker::phone;
use stancebox_worker::ratelimit::{self, CounterStore, DbCounterStore};
use stancebox_worker::screen::{LineType, PhoneTypeScreen};
use stancebox_worker::util::now_ts;
use stancebox_worker::{ledger, suppress, token, verify};

// --- mock collaborators ----------------------------------------------------

#[derive(Default)]
struct MemoryCounterStore {
    counters: Mutex<HashMap<(String, String), (i32, i64)>>,
}

impl CounterStore for MemoryCounterStore {
    async fn incr(
        &self,
        bucket: &str,
        key: &str,
        window_secs: i64,
        now: i64,
    ) -> Result<(i32, i64), VoteError> {
        let mut map = self.counters.lock().unwrap();
        let entry = map
            .entry((bucket.to_string(), key.to_string()))
            .or_insert((0, now + window_secs));
        if entry.1 <= now {
            *entry = (0, now + window_secs);
        }
        entry.0 += 1;
        Ok(*entry)
    }
}

struct StaticCaptcha {
    pass: bool,
}

impl CaptchaVerifier for StaticCaptcha {
    async fn verify(&self, _response_token: &str) -> Result<bool, VoteError> {
        Ok(self.pass)
    }
}

struct BrokenCaptcha;

impl CaptchaVerifier for BrokenCaptcha {
    async fn verify(&self, _response_token: &str) -> Result<bool, VoteError> {
        Err(VoteError::Upstream("captcha verifier down".to_string()))
    }
}

#[derive(Default)]
struct RecordingSms {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSms {
    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn last_text(&self) -> String {
        self.sent.lock().unwrap().last().expect("an SMS was sent").1.clone()
    }
}

impl SmsSender for RecordingSms {
    async fn send_sms(&self, to_e164: &str, text: &str) -> Result<(), VoteError> {
        self.sent
            .lock()
            .unwrap()
            .push((to_e164.to_string(), text.to_string()));
        Ok(())
    }
}

struct StaticScreen {
    line: LineType,
}

impl PhoneTypeScreen for StaticScreen {
    async fn classify(&self, _e164: &str) -> Result<LineType, VoteError> {
        Ok(self.line)
    }
}

struct BrokenScreen;

impl PhoneTypeScreen for BrokenScreen {
    async fn classify(&self, _e164: &str) -> Result<LineType, VoteError> {
        Err(VoteError::Upstream("lookup down".to_string()))
    }
}

#[derive(Default)]
struct MemorySlotStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl SlotStore for MemorySlotStore {
    async fn get(&self, device_id: &str) -> Result<Option<String>, VoteError> {
        Ok(self.blobs.lock().unwrap().get(device_id).cloned())
    }

    async fn put(&self, device_id: &str, blob: &str, _ttl_secs: i64) -> Result<(), VoteError> {
        self.blobs
            .lock()
            .unwrap()
            .insert(device_id.to_string(), blob.to_string());
        Ok(())
    }
}

struct DeadSlotStore;

impl SlotStore for DeadSlotStore {
    async fn get(&self, _device_id: &str) -> Result<Option<String>, VoteError> {
        Err(VoteError::Upstream("KV down".to_string()))
    }

    async fn put(&self, _device_id: &str, _blob: &str, _ttl_secs: i64) -> Result<(), VoteError> {
        Err(VoteError::Upstream("KV down".to_string()))
    }
}

// --- helpers ---------------------------------------------------------------

async fn setup_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:".to_string());
    // One pooled connection so every query sees the same in-memory database.
    opts.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await.expect("connect sqlite");
    Migrator::up(&db, None).await.expect("apply migrations");
    db
}

fn test_config() -> Config {
    Config {
        fingerprint_salt: "test-fingerprint-salt".to_string(),
        credential_secret: "test-credential-secret".to_string(),
        ballot_base_url: "https://stance.example".to_string(),
        admin_notify_email: None,
    }
}

fn code_from_sms(text: &str) -> String {
    text.chars().take(6).collect()
}

fn link_token_from_sms(text: &str) -> String {
    text.split("?t=")
        .nth(1)
        .expect("SMS contains a ballot URL")
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .collect()
}

async fn insert_vote_row(db: &DatabaseConnection, identifier: &str) {
    vote::ActiveModel {
        identifier: Set(identifier.to_string()),
        value: Set(true),
        source: Set(SOURCE_BALLOT.to_string()),
        created_at: Set(now_ts()),
    }
    .insert(db)
    .await
    .expect("insert vote row");
}

async fn seed_candidate(db: &DatabaseConnection, name: &str) -> String {
    let id = format!("cand-{name}");
    candidate::ActiveModel {
        id: Set(id.clone()),
        name: Set(name.to_string()),
        region: Set(None),
        fingerprint: Set(None),
        contact_phone: Set(None),
        status: Set(candidate::STATUS_UNCLAIMED),
        created_at: Set(now_ts()),
        updated_at: Set(now_ts()),
    }
    .insert(db)
    .await
    .expect("seed candidate");
    id
}

async fn vote_count(db: &DatabaseConnection) -> usize {
    Vote::find().all(db).await.expect("list votes").len()
}

// --- credential path -------------------------------------------------------

/// Property 7: the full interactive scenario for +45 12 34 56 78.
#[tokio::test]
async fn verify_confirm_cast_happy_path() {
    let db = setup_db().await;
    let config = test_config();
    let counters = MemoryCounterStore::default();
    let sms = RecordingSms::default();

    verify::request_code(
        &db,
        &counters,
        &StaticCaptcha { pass: true },
        &sms,
        &config,
        "45",
        "12345678",
        "captcha-ok",
    )
    .await
    .expect("code request succeeds");

    assert_eq!(sms.count(), 1);
    let code = code_from_sms(&sms.last_text());

    let credential = verify::confirm_code(&db, &counters, &config, "45", "12345678", &code)
        .await
        .expect("confirm succeeds");

    ledger::cast_vote(&db, &config, &credential, true)
        .await
        .expect("first cast succeeds");

    let err = ledger::cast_vote(&db, &config, &credential, true)
        .await
        .expect_err("second cast is rejected");
    assert!(matches!(err, VoteError::AlreadyVoted));

    // Property 2: exactly one row, and nothing in it derives from the phone.
    let votes = Vote::find().all(&db).await.unwrap();
    assert_eq!(votes.len(), 1);
    let fp = phone::fingerprint(&config.fingerprint_salt, "+4512345678");
    assert_ne!(votes[0].identifier, fp);
    assert!(!votes[0].identifier.contains("12345678"));
    assert_eq!(votes[0].source, "credential");

    // The verified-once marker exists, keyed by fingerprint, apart from the
    // vote.
    let marker = PhoneVerification::find_by_id(fp).one(&db).await.unwrap();
    assert!(marker.is_some());
}

/// Property 1: N concurrent casts with one credential produce one vote row.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_casts_yield_exactly_one_vote() {
    let db = setup_db().await;
    let config = test_config();

    let credential = token::issue(
        config.credential_secret.as_bytes(),
        "00112233445566778899aabbccddeeff",
        now_ts(),
        300,
    )
    .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let db = db.clone();
        let config = config.clone();
        let credential = credential.clone();
        handles.push(tokio::spawn(async move {
            ledger::cast_vote(&db, &config, &credential, true).await
        }));
    }

    let mut ok = 0;
    let mut already = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => ok += 1,
            Err(VoteError::AlreadyVoted) => already += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(ok, 1);
    assert_eq!(already, 7);
    assert_eq!(vote_count(&db).await, 1);
}

/// Property 3: exhausted challenges stay dead even for the correct code.
#[tokio::test]
async fn wrong_codes_exhaust_the_challenge_terminally() {
    let db = setup_db().await;
    let config = test_config();
    let counters = MemoryCounterStore::default();
    let sms = RecordingSms::default();

    verify::request_code(
        &db,
        &counters,
        &StaticCaptcha { pass: true },
        &sms,
        &config,
        "45",
        "12345678",
        "captcha-ok",
    )
    .await
    .unwrap();
    let code = code_from_sms(&sms.last_text());
    let wrong = if code == "000000" { "000001" } else { "000000" };

    for expected_left in [2, 1, 0] {
        let err = verify::confirm_code(&db, &counters, &config, "45", "12345678", wrong)
            .await
            .expect_err("wrong code is rejected");
        match err {
            VoteError::WrongCode { attempts_left } => assert_eq!(attempts_left, expected_left),
            other => panic!("unexpected error: {other}"),
        }
    }

    let err = verify::confirm_code(&db, &counters, &config, "45", "12345678", &code)
        .await
        .expect_err("correct code no longer works");
    assert!(matches!(err, VoteError::TooManyAttempts));

    // A fresh request issues a new authoritative challenge.
    verify::request_code(
        &db,
        &counters,
        &StaticCaptcha { pass: true },
        &sms,
        &config,
        "45",
        "12345678",
        "captcha-ok",
    )
    .await
    .unwrap();
    let fresh = code_from_sms(&sms.last_text());
    verify::confirm_code(&db, &counters, &config, "45", "12345678", &fresh)
        .await
        .expect("fresh challenge confirms");
}

#[tokio::test]
async fn failed_captcha_blocks_issuance_and_sends_nothing() {
    let db = setup_db().await;
    let config = test_config();
    let counters = MemoryCounterStore::default();
    let sms = RecordingSms::default();

    let err = verify::request_code(
        &db,
        &counters,
        &StaticCaptcha { pass: false },
        &sms,
        &config,
        "45",
        "12345678",
        "captcha-bad",
    )
    .await
    .expect_err("captcha failure blocks");
    assert!(matches!(err, VoteError::CaptchaFailed));

    // Fail-closed: a dead verifier blocks too.
    let err = verify::request_code(
        &db,
        &counters,
        &BrokenCaptcha,
        &sms,
        &config,
        "45",
        "12345678",
        "captcha-any",
    )
    .await
    .expect_err("verifier outage blocks");
    assert!(matches!(err, VoteError::Upstream(_)));

    assert_eq!(sms.count(), 0);
}

#[tokio::test]
async fn per_phone_code_requests_are_rate_limited() {
    let db = setup_db().await;
    let config = test_config();
    let counters = MemoryCounterStore::default();
    let sms = RecordingSms::default();

    for _ in 0..RATE_SMS_CODE_PHONE.max {
        verify::request_code(
            &db,
            &counters,
            &StaticCaptcha { pass: true },
            &sms,
            &config,
            "45",
            "12345678",
            "captcha-ok",
        )
        .await
        .unwrap();
    }

    let err = verify::request_code(
        &db,
        &counters,
        &StaticCaptcha { pass: true },
        &sms,
        &config,
        "45",
        "12345678",
        "captcha-ok",
    )
    .await
    .expect_err("limit reached");
    assert!(matches!(err, VoteError::RateLimited { .. }));

    // A rejected gate triggers no side effect.
    assert_eq!(sms.count(), RATE_SMS_CODE_PHONE.max as usize);
}

#[tokio::test]
async fn confirm_without_challenge_fails() {
    let db = setup_db().await;
    let config = test_config();
    let counters = MemoryCounterStore::default();

    let err = verify::confirm_code(&db, &counters, &config, "45", "12345678", "123456")
        .await
        .expect_err("nothing to confirm");
    assert!(matches!(err, VoteError::NoActiveChallenge));
}

#[tokio::test]
async fn garbage_credentials_are_rejected_offline() {
    let db = setup_db().await;
    let config = test_config();

    for bad in ["", "abc", "a.b.c", "a.b.c.d"] {
        let err = ledger::cast_vote(&db, &config, bad, true)
            .await
            .expect_err("garbage rejected");
        assert!(matches!(err, VoteError::InvalidCredential));
    }
    assert_eq!(vote_count(&db).await, 0);
}

// --- rate limiter ----------------------------------------------------------

#[tokio::test]
async fn db_counter_store_counts_and_resets_windows() {
    let db = setup_db().await;
    let store = DbCounterStore { db: &db };
    let now = now_ts();

    for expected in 1..=4 {
        let (hits, reset_at) = store.incr("test.bucket", "key-1", 60, now).await.unwrap();
        assert_eq!(hits, expected);
        assert_eq!(reset_at, now + 60);
    }

    // Independent keys do not interfere.
    let (hits, _) = store.incr("test.bucket", "key-2", 60, now).await.unwrap();
    assert_eq!(hits, 1);

    // A later call past the reset starts a fresh window.
    let (hits, reset_at) = store
        .incr("test.bucket", "key-1", 60, now + 120)
        .await
        .unwrap();
    assert_eq!(hits, 1);
    assert_eq!(reset_at, now + 180);

    // One row per (bucket, key); the window reset reuses it.
    let rows = RateLimitCounter::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn enforce_reports_retry_after() {
    let db = setup_db().await;
    let store = DbCounterStore { db: &db };
    let now = now_ts();

    for _ in 0..RATE_SMS_CODE_PHONE.max {
        ratelimit::enforce(&store, &RATE_SMS_CODE_PHONE, "fp", now)
            .await
            .unwrap();
    }

    match ratelimit::enforce(&store, &RATE_SMS_CODE_PHONE, "fp", now).await {
        Err(VoteError::RateLimited { retry_after }) => {
            assert!(retry_after > 0 && retry_after <= RATE_SMS_CODE_PHONE.window_secs);
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

// --- ballot link path ------------------------------------------------------

#[tokio::test]
async fn ballot_link_round_trip() {
    let db = setup_db().await;
    let config = test_config();
    let counters = MemoryCounterStore::default();
    let sms = RecordingSms::default();
    let slots = MemorySlotStore::default();
    let screen = StaticScreen {
        line: LineType::Mobile,
    };

    ballot::send_ballot_link(
        &db,
        &counters,
        &screen,
        &slots,
        &sms,
        &config,
        "45",
        "22334455",
        Some("device-1"),
        ROLE_VOTER,
    )
    .await
    .expect("send succeeds");

    let text = sms.last_text();
    assert!(text.contains("https://stance.example/ballot?t="));
    let token = link_token_from_sms(&text);
    assert_eq!(token.len(), 64);

    let status = ballot::check_ballot_link(&db, &token).await.unwrap();
    assert_eq!(
        status,
        BallotStatus::Valid {
            role: ROLE_VOTER.to_string()
        }
    );

    ballot::redeem_ballot_link(&db, &slots, &token, true)
        .await
        .expect("redeem succeeds");
    assert_eq!(vote_count(&db).await, 1);

    // The vote is keyed by the retained fingerprint on this path.
    let fp = phone::fingerprint(&config.fingerprint_salt, "+4522334455");
    let votes = Vote::find().all(&db).await.unwrap();
    assert_eq!(votes[0].identifier, fp);
    assert_eq!(votes[0].source, "ballot");

    // Terminal afterwards.
    assert_eq!(
        ballot::check_ballot_link(&db, &token).await.unwrap(),
        BallotStatus::Used
    );
    let err = ballot::redeem_ballot_link(&db, &slots, &token, true)
        .await
        .expect_err("second redemption is rejected");
    assert!(matches!(err, VoteError::LinkUsed));
    assert_eq!(vote_count(&db).await, 1);

    // And the phone cannot request another link.
    let err = ballot::send_ballot_link(
        &db,
        &counters,
        &screen,
        &slots,
        &sms,
        &config,
        "45",
        "22334455",
        None,
        ROLE_VOTER,
    )
    .await
    .expect_err("already voted");
    assert!(matches!(err, VoteError::AlreadyVoted));
}

/// Property 6: expired links answer `expired` and mutate nothing.
#[tokio::test]
async fn expired_ballot_link_is_terminal_without_mutation() {
    let db = setup_db().await;
    let slots = MemorySlotStore::default();

    let token = "ab".repeat(32);
    ballot_link::ActiveModel {
        token: Set(token.clone()),
        fingerprint: Set("fp-expired".to_string()),
        device_id: Set(None),
        role: Set(ROLE_VOTER.to_string()),
        used: Set(false),
        created_at: Set(now_ts() - 100_000),
        expires_at: Set(now_ts() - 1),
    }
    .insert(&db)
    .await
    .unwrap();

    assert_eq!(
        ballot::check_ballot_link(&db, &token).await.unwrap(),
        BallotStatus::Expired
    );

    let before = vote_count(&db).await;
    let err = ballot::redeem_ballot_link(&db, &slots, &token, true)
        .await
        .expect_err("expired link cannot be redeemed");
    assert!(matches!(err, VoteError::LinkExpired));
    assert_eq!(vote_count(&db).await, before);

    let link = BallotLink::find_by_id(token).one(&db).await.unwrap().unwrap();
    assert!(!link.used);
}

#[tokio::test]
async fn unknown_ballot_tokens_report_not_found() {
    let db = setup_db().await;
    let slots = MemorySlotStore::default();

    assert_eq!(
        ballot::check_ballot_link(&db, "deadbeef").await.unwrap(),
        BallotStatus::NotFound
    );
    let err = ballot::redeem_ballot_link(&db, &slots, "deadbeef", false)
        .await
        .expect_err("unknown token");
    assert!(matches!(err, VoteError::LinkNotFound));
}

#[tokio::test]
async fn non_mobile_numbers_are_rejected_but_lookup_outage_is_not() {
    let db = setup_db().await;
    let config = test_config();
    let counters = MemoryCounterStore::default();
    let sms = RecordingSms::default();
    let slots = MemorySlotStore::default();

    for line in [LineType::Voip, LineType::Landline] {
        let err = ballot::send_ballot_link(
            &db,
            &counters,
            &StaticScreen { line },
            &slots,
            &sms,
            &config,
            "45",
            "33445566",
            None,
            ROLE_VOTER,
        )
        .await
        .expect_err("non-mobile rejected");
        assert!(matches!(err, VoteError::NonMobileNumber));
    }
    assert_eq!(sms.count(), 0);

    // Fail-open: a dead lookup service lets the request through.
    ballot::send_ballot_link(
        &db,
        &counters,
        &BrokenScreen,
        &slots,
        &sms,
        &config,
        "45",
        "33445566",
        None,
        ROLE_VOTER,
    )
    .await
    .expect("lookup outage falls through");
    assert_eq!(sms.count(), 1);
}

/// Property 8: the fourth pending link for one device is refused, no SMS.
#[tokio::test]
async fn device_slot_cap_blocks_the_fourth_pending_link() {
    let db = setup_db().await;
    let config = test_config();
    let counters = MemoryCounterStore::default();
    let sms = RecordingSms::default();
    let slots = MemorySlotStore::default();
    let screen = StaticScreen {
        line: LineType::Mobile,
    };

    for phone in ["11111111", "22222222", "33333333"] {
        ballot::send_ballot_link(
            &db,
            &counters,
            &screen,
            &slots,
            &sms,
            &config,
            "45",
            phone,
            Some("device-1"),
            ROLE_VOTER,
        )
        .await
        .expect("within the cap");
    }
    assert_eq!(sms.count(), 3);

    let err = ballot::send_ballot_link(
        &db,
        &counters,
        &screen,
        &slots,
        &sms,
        &config,
        "45",
        "44444444",
        Some("device-1"),
        ROLE_VOTER,
    )
    .await
    .expect_err("cap reached");
    assert!(matches!(err, VoteError::TooManyPendingLinks));
    assert_eq!(sms.count(), 3);

    // Redeeming one frees a slot.
    let first_text = sms.sent.lock().unwrap()[0].1.clone();
    let token = link_token_from_sms(&first_text);
    ballot::redeem_ballot_link(&db, &slots, &token, true)
        .await
        .unwrap();

    ballot::send_ballot_link(
        &db,
        &counters,
        &screen,
        &slots,
        &sms,
        &config,
        "45",
        "44444444",
        Some("device-1"),
        ROLE_VOTER,
    )
    .await
    .expect("slot was released");

    // A different device is unaffected by device-1's slots.
    ballot::send_ballot_link(
        &db,
        &counters,
        &screen,
        &slots,
        &sms,
        &config,
        "45",
        "55555555",
        Some("device-2"),
        ROLE_VOTER,
    )
    .await
    .expect("other device unaffected");
}

#[tokio::test]
async fn dead_slot_store_fails_open() {
    let db = setup_db().await;
    let config = test_config();
    let counters = MemoryCounterStore::default();
    let sms = RecordingSms::default();

    ballot::send_ballot_link(
        &db,
        &counters,
        &StaticScreen {
            line: LineType::Mobile,
        },
        &DeadSlotStore,
        &sms,
        &config,
        "45",
        "66778899",
        Some("device-1"),
        ROLE_VOTER,
    )
    .await
    .expect("guard outage does not block the link");
    assert_eq!(sms.count(), 1);
}

// --- suppression -----------------------------------------------------------

/// Property 4: suppression is an idempotent upsert.
#[tokio::test]
async fn suppression_is_idempotent_and_blocks_contact() {
    let db = setup_db().await;
    let config = test_config();
    let counters = MemoryCounterStore::default();
    let sms = RecordingSms::default();
    let slots = MemorySlotStore::default();

    let fp = phone::fingerprint(&config.fingerprint_salt, "+4512345678");

    suppress::suppress(&db, &fp, SCOPE_ALL, Some("user opt-out"))
        .await
        .unwrap();
    suppress::suppress(&db, &fp, SCOPE_ALL, Some("user opt-out"))
        .await
        .expect("second opt-out is a no-op");

    let rows = PhoneSuppression::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 1);

    // `all` covers any scope.
    assert!(suppress::is_suppressed(&db, &fp, SCOPE_CONTACT).await.unwrap());

    let err = verify::request_code(
        &db,
        &counters,
        &StaticCaptcha { pass: true },
        &sms,
        &config,
        "45",
        "12345678",
        "captcha-ok",
    )
    .await
    .expect_err("suppressed phones get no code");
    assert!(matches!(err, VoteError::Suppressed));

    let err = ballot::send_ballot_link(
        &db,
        &counters,
        &StaticScreen {
            line: LineType::Mobile,
        },
        &slots,
        &sms,
        &config,
        "45",
        "12345678",
        None,
        ROLE_VOTER,
    )
    .await
    .expect_err("suppressed phones get no link");
    assert!(matches!(err, VoteError::Suppressed));

    assert_eq!(sms.count(), 0);
}

#[tokio::test]
async fn scoped_suppression_only_matches_its_scope() {
    let db = setup_db().await;

    suppress::suppress(&db, "fp-scoped", SCOPE_CONTACT, None)
        .await
        .unwrap();

    assert!(suppress::is_suppressed(&db, "fp-scoped", SCOPE_CONTACT).await.unwrap());
    assert!(!suppress::is_suppressed(&db, "fp-scoped", phone_suppression::SCOPE_CLAIM)
        .await
        .unwrap());
}

// --- candidate claim -------------------------------------------------------

/// Property 5: one of two concurrent claimants wins, the other conflicts.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_resolve_to_one_winner() {
    let db = setup_db().await;
    let candidate_id = seed_candidate(&db, "alpha").await;

    insert_vote_row(&db, "fp-claimant-a").await;
    insert_vote_row(&db, "fp-claimant-b").await;

    let mut handles = Vec::new();
    for fp in ["fp-claimant-a", "fp-claimant-b"] {
        let db = db.clone();
        let candidate_id = candidate_id.clone();
        handles.push(tokio::spawn(async move {
            candidates::claim_candidate(&db, &candidate_id, fp, None).await
        }));
    }

    let mut ok = 0;
    let mut conflict = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => ok += 1,
            Err(VoteError::AlreadyClaimed) => conflict += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!((ok, conflict), (1, 1));

    let row = entity::Candidate::find_by_id(candidate_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(row.fingerprint.is_some());
    assert_eq!(row.status, candidate::STATUS_CLAIMED);
}

#[tokio::test]
async fn claim_requires_a_prior_vote() {
    let db = setup_db().await;
    let candidate_id = seed_candidate(&db, "beta").await;

    let err = candidates::claim_candidate(&db, &candidate_id, "fp-no-vote", None)
        .await
        .expect_err("claiming before voting is rejected");
    assert!(matches!(err, VoteError::NotYetVoted));

    let row = entity::Candidate::find_by_id(candidate_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(row.fingerprint.is_none());
}

#[tokio::test]
async fn claim_of_unknown_candidate_is_not_a_conflict() {
    let db = setup_db().await;
    insert_vote_row(&db, "fp-voted").await;

    let err = candidates::claim_candidate(&db, "no-such-id", "fp-voted", None)
        .await
        .expect_err("unknown candidate");
    assert!(matches!(err, VoteError::Validation(_)));
}

#[tokio::test]
async fn register_rejects_a_second_candidacy_for_the_same_phone() {
    let db = setup_db().await;
    insert_vote_row(&db, "fp-registrant").await;

    let id = candidates::register_candidate(&db, "fp-registrant", "Jane Voter", Some("North"), None)
        .await
        .expect("first registration succeeds");
    assert!(!id.is_empty());

    let err = candidates::register_candidate(&db, "fp-registrant", "Jane Again", None, None)
        .await
        .expect_err("second registration is rejected");
    assert!(matches!(err, VoteError::AlreadyRegistered));

    let err = candidates::register_candidate(&db, "fp-registrant", "   ", None, None)
        .await
        .expect_err("blank name");
    assert!(matches!(err, VoteError::Validation(_)));
}

#[tokio::test]
async fn ballot_link_fingerprint_carries_the_claim() {
    let db = setup_db().await;
    let config = test_config();
    let counters = MemoryCounterStore::default();
    let sms = RecordingSms::default();
    let slots = MemorySlotStore::default();

    ballot::send_ballot_link(
        &db,
        &counters,
        &StaticScreen {
            line: LineType::Mobile,
        },
        &slots,
        &sms,
        &config,
        "45",
        "87654321",
        None,
        ROLE_CANDIDATE,
    )
    .await
    .unwrap();
    let token = link_token_from_sms(&sms.last_text());

    let status = ballot::check_ballot_link(&db, &token).await.unwrap();
    assert_eq!(
        status,
        BallotStatus::Valid {
            role: ROLE_CANDIDATE.to_string()
        }
    );

    ballot::redeem_ballot_link(&db, &slots, &token, true)
        .await
        .unwrap();

    // The spent link still resolves the fingerprint for the claim step; the
    // phone number itself is never re-exposed.
    let fp = ballot::link_fingerprint(&db, &token).await.unwrap();
    assert_eq!(fp, phone::fingerprint(&config.fingerprint_salt, "+4587654321"));

    let candidate_id = seed_candidate(&db, "gamma").await;
    candidates::claim_candidate(&db, &candidate_id, &fp, Some("+4587654321"))
        .await
        .expect("claim after voting succeeds");

    let err = candidates::claim_candidate(&db, &candidate_id, "fp-other", None).await;
    assert!(matches!(err, Err(VoteError::NotYetVoted)));
}
