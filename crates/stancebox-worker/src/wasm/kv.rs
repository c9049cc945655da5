use worker::Env;

use crate::device_slots::SlotStore;
use crate::error::VoteError;

const SLOTS_BINDING: &str = "DEVICE_SLOTS";

/// Device slot storage on Workers KV.
///
/// KV has no compare-and-set; the guard is explicitly best-effort and the
/// caller fails open on any error here.
pub struct KvSlotStore {
    store: worker::kv::KvStore,
}

impl KvSlotStore {
    pub fn from_env(env: &Env) -> Result<Self, worker::Error> {
        Ok(Self {
            store: env.kv(SLOTS_BINDING)?,
        })
    }

    fn key(device_id: &str) -> String {
        format!("slots:{device_id}")
    }
}

impl SlotStore for KvSlotStore {
    async fn get(&self, device_id: &str) -> Result<Option<String>, VoteError> {
        self.store
            .get(&Self::key(device_id))
            .text()
            .await
            .map_err(|e| VoteError::Upstream(format!("KV read failed: {e}")))
    }

    async fn put(&self, device_id: &str, blob: &str, ttl_secs: i64) -> Result<(), VoteError> {
        self.store
            .put(&Self::key(device_id), blob)
            .map_err(|e| VoteError::Upstream(format!("KV write failed: {e}")))?
            .expiration_ttl(ttl_secs.max(60) as u64)
            .execute()
            .await
            .map_err(|e| VoteError::Upstream(format!("KV write failed: {e}")))
    }
}
