use serde::{Deserialize, Serialize};

use crate::config::{BALLOT_LINK_TTL_SECS, DEVICE_SLOT_CAP, DEVICE_SLOT_TTL_MARGIN_SECS};
use crate::error::VoteError;

/// Best-effort external key-value store holding per-device pending slots.
///
/// Not a correctness invariant: when the store is unreachable the guard
/// fails open and the relational path proceeds.
pub trait SlotStore {
    async fn get(&self, device_id: &str) -> Result<Option<String>, VoteError>;
    async fn put(&self, device_id: &str, blob: &str, ttl_secs: i64) -> Result<(), VoteError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct PendingSlot {
    token: String,
    /// Unix timestamp (seconds).
    expires_at: i64,
}

fn decode_slots(blob: Option<String>) -> Vec<PendingSlot> {
    blob.and_then(|b| serde_json::from_str(&b).ok())
        .unwrap_or_default()
}

/// Reserve a pending-link slot for `device_id`.
///
/// Expired entries are pruned lazily at read time, never swept. Returns
/// `TooManyPendingLinks` at the cap.
pub async fn reserve(
    store: &impl SlotStore,
    device_id: &str,
    link_token: &str,
    now: i64,
) -> Result<(), VoteError> {
    let blob = match store.get(device_id).await {
        Ok(b) => b,
        Err(_) => return Ok(()),
    };

    let mut slots = decode_slots(blob);
    slots.retain(|s| s.expires_at > now);
    if slots.len() >= DEVICE_SLOT_CAP {
        return Err(VoteError::TooManyPendingLinks);
    }

    slots.push(PendingSlot {
        token: link_token.to_string(),
        expires_at: now + BALLOT_LINK_TTL_SECS,
    });

    let encoded = serde_json::to_string(&slots)
        .map_err(|e| VoteError::Internal(format!("Failed to serialize device slots: {e}")))?;

    // A failed write degrades the guard, not the request.
    let _ = store
        .put(
            device_id,
            &encoded,
            BALLOT_LINK_TTL_SECS + DEVICE_SLOT_TTL_MARGIN_SECS,
        )
        .await;

    Ok(())
}

/// Free the slot tied to a redeemed or dead link. Best-effort.
pub async fn release(store: &impl SlotStore, device_id: &str, link_token: &str, now: i64) {
    let Ok(blob) = store.get(device_id).await else {
        return;
    };

    let mut slots = decode_slots(blob);
    let before = slots.len();
    slots.retain(|s| s.token != link_token && s.expires_at > now);
    if slots.len() == before {
        return;
    }

    if let Ok(encoded) = serde_json::to_string(&slots) {
        let _ = store
            .put(
                device_id,
                &encoded,
                BALLOT_LINK_TTL_SECS + DEVICE_SLOT_TTL_MARGIN_SECS,
            )
            .await;
    }
}
