//! In-flight run tracking, one entry per conversation.
//!
//! A conversation may have at most one run being awaited at a time. The
//! entry holds the `CancellationToken` the poller listens on, so another
//! request (cancel or delete) can stop the wait.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Registry of conversations with a run currently being awaited.
#[derive(Clone, Default)]
pub struct RunRegistry {
    runs: Arc<DashMap<Uuid, CancellationToken>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `conversation_id`.
    ///
    /// Returns `None` if a run is already in flight for that conversation.
    /// The slot is released when the returned guard is dropped.
    pub fn try_begin(&self, conversation_id: Uuid) -> Option<RunGuard> {
        match self.runs.entry(conversation_id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let token = CancellationToken::new();
                slot.insert(token.clone());
                Some(RunGuard {
                    runs: Arc::clone(&self.runs),
                    conversation_id,
                    token,
                })
            }
        }
    }

    /// Cancel the in-flight run for a conversation. Returns `false` if none.
    pub fn cancel(&self, conversation_id: &Uuid) -> bool {
        match self.runs.get(conversation_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, conversation_id: &Uuid) -> bool {
        self.runs.contains_key(conversation_id)
    }

    /// Number of runs currently being awaited.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Holds a conversation's in-flight slot; releases it on drop.
///
/// Dropping the guard does not cancel the remote run. Callers that may be
/// dropped mid-run (HTTP handlers) drive the send on a spawned task so the
/// poller always reaches a terminal state or its deadline.
pub struct RunGuard {
    runs: Arc<DashMap<Uuid, CancellationToken>>,
    conversation_id: Uuid,
    token: CancellationToken,
}

impl RunGuard {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.runs.remove(&self.conversation_id);
    }
}
