//! Per-session single-writer locks.
//!
//! Each session gets its own async mutex; holders of different sessions never
//! contend. The registry lock is only held to look up, insert or evict an
//! entry. An entry is evicted when its last guard drops with nobody waiting,
//! so the registry only holds sessions that are being written.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::foundation::SessionId;

type LockMap = HashMap<SessionId, Arc<AsyncMutex<()>>>;

/// Held while a session is being mutated.
pub struct SessionGuard {
    guard: Option<OwnedMutexGuard<()>>,
    session_id: SessionId,
    locks: Arc<Mutex<LockMap>>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        // release first so our own clone no longer counts
        self.guard.take();

        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // clones are only taken under the registry lock, so a count of one
        // means no holder and no waiter
        if locks
            .get(&self.session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.session_id);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionGate {
    locks: Arc<Mutex<LockMap>>,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other writer holds `session_id`.
    pub async fn lock(&self, session_id: SessionId) -> SessionGuard {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(locks.entry(session_id).or_default())
        };
        SessionGuard {
            guard: Some(lock.lock_owned().await),
            session_id,
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of sessions currently locked or waited on.
    pub fn tracked_sessions(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
