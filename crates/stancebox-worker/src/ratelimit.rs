use sea_orm::{ConnectionTrait, DatabaseConnection, Statement, Value};

use crate::config::RateWindow;
use crate::error::VoteError;

/// Shared counter behind the rate limiter.
///
/// `incr` must be a single atomic operation on the backing store; callers
/// decide fail-open vs fail-closed when the store errors.
pub trait CounterStore {
    /// Bump (bucket, key) within the current window. Returns the hit count
    /// including this call and the window's reset timestamp.
    async fn incr(
        &self,
        bucket: &str,
        key: &str,
        window_secs: i64,
        now: i64,
    ) -> Result<(i32, i64), VoteError>;
}

#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: i32,
    /// Seconds until the window resets; meaningful when `allowed` is false.
    pub retry_after: i64,
}

pub async fn check(
    store: &impl CounterStore,
    window: &RateWindow,
    key: &str,
    now: i64,
) -> Result<RateDecision, VoteError> {
    let (hits, reset_at) = store
        .incr(window.bucket, key, window.window_secs, now)
        .await?;
    Ok(RateDecision {
        allowed: hits <= window.max,
        remaining: (window.max - hits).max(0),
        retry_after: (reset_at - now).max(0),
    })
}

/// Fail-closed gate: store errors propagate, an exceeded window is
/// `RateLimited`.
pub async fn enforce(
    store: &impl CounterStore,
    window: &RateWindow,
    key: &str,
    now: i64,
) -> Result<(), VoteError> {
    let decision = check(store, window, key, now).await?;
    if !decision.allowed {
        return Err(VoteError::RateLimited {
            retry_after: decision.retry_after,
        });
    }
    Ok(())
}

/// Counter store on the relational database.
///
/// The whole window update is one upsert so concurrent increments for the
/// same key cannot interleave; an expired window resets in the same
/// statement.
pub struct DbCounterStore<'a> {
    pub db: &'a DatabaseConnection,
}

impl CounterStore for DbCounterStore<'_> {
    async fn incr(
        &self,
        bucket: &str,
        key: &str,
        window_secs: i64,
        now: i64,
    ) -> Result<(i32, i64), VoteError> {
        let reset = now + window_secs;
        let stmt = Statement::from_sql_and_values(
            self.db.get_database_backend(),
            r#"
            INSERT INTO rate_limit_counters (bucket, counter_key, hits, window_reset_at)
            VALUES ($1, $2, 1, $3)
            ON CONFLICT (bucket, counter_key) DO UPDATE SET
                hits = CASE
                    WHEN rate_limit_counters.window_reset_at <= $4 THEN 1
                    ELSE rate_limit_counters.hits + 1
                END,
                window_reset_at = CASE
                    WHEN rate_limit_counters.window_reset_at <= $4 THEN $3
                    ELSE rate_limit_counters.window_reset_at
                END
            RETURNING hits, window_reset_at
            "#,
            [
                Value::from(bucket),
                Value::from(key),
                Value::from(reset),
                Value::from(now),
            ],
        );

        let row = self
            .db
            .query_one(stmt)
            .await?
            .ok_or_else(|| VoteError::Internal("rate counter upsert returned no row".to_string()))?;

        let hits: i32 = row.try_get("", "hits")?;
        let reset_at: i64 = row.try_get("", "window_reset_at")?;
        Ok((hits, reset_at))
    }
}
