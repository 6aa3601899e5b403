//! Pending deferred continuations, tracked per campaign so they can be
//! cancelled in bulk.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// Identifies one registered continuation.
pub type TimerHandle = u64;

#[derive(Default)]
pub struct TimerRegistry {
    next_handle: AtomicU64,
    pending: Mutex<HashMap<String, HashMap<TimerHandle, CancellationToken>>>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, HashMap<TimerHandle, CancellationToken>>> {
        // The map holds only tokens; a panic elsewhere cannot leave it half-updated.
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a continuation for `campaign_id`. The token fires if the
    /// continuation is cancelled before its delay elapses.
    pub fn add(&self, campaign_id: &str) -> (TimerHandle, CancellationToken) {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        self.lock()
            .entry(campaign_id.to_string())
            .or_default()
            .insert(handle, token.clone());
        (handle, token)
    }

    /// Forget a continuation that has fired.
    pub fn complete(&self, campaign_id: &str, handle: TimerHandle) {
        let mut pending = self.lock();
        if let Some(handles) = pending.get_mut(campaign_id) {
            handles.remove(&handle);
            if handles.is_empty() {
                pending.remove(campaign_id);
            }
        }
    }

    /// Cancel every pending continuation of `campaign_id`. Idempotent.
    pub fn cancel_all(&self, campaign_id: &str) -> usize {
        let removed = self.lock().remove(campaign_id).unwrap_or_default();
        for token in removed.values() {
            token.cancel();
        }
        removed.len()
    }

    /// Cancel every continuation of every campaign.
    pub fn cancel_everything(&self) -> usize {
        let drained: Vec<_> = self.lock().drain().collect();
        drained
            .iter()
            .flat_map(|(_, handles)| handles.values())
            .map(|token| token.cancel())
            .count()
    }

    pub fn pending(&self, campaign_id: &str) -> usize {
        self.lock().get(campaign_id).map_or(0, |h| h.len())
    }
}
