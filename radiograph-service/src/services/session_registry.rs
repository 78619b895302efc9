//! Process-local store of per-session interaction state.
//!
//! The session cookie carries only a workspace key; the state itself lives
//! here, one slot per key. Closures passed to `update` run under the shard
//! lock and must not await.

use crate::models::SessionState;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_sessions::Session;
use uuid::Uuid;

/// Key under which the workspace id is stored in the cookie session.
pub const WORKSPACE_KEY: &str = "workspace_id";

struct Slot {
    state: SessionState,
    touched_at: Instant,
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    slots: Arc<DashMap<Uuid, Slot>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the state for `key`; `Idle` when nothing is held. Reading
    /// counts as activity for the idle sweep.
    pub fn snapshot(&self, key: Uuid) -> SessionState {
        self.slots
            .get_mut(&key)
            .map(|mut slot| {
                slot.touched_at = Instant::now();
                slot.state.clone()
            })
            .unwrap_or_default()
    }

    /// Mutate the state for `key`, creating an idle slot if needed.
    pub fn update<R>(&self, key: Uuid, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut slot = self.slots.entry(key).or_insert_with(|| Slot {
            state: SessionState::default(),
            touched_at: Instant::now(),
        });
        slot.touched_at = Instant::now();
        f(&mut slot.state)
    }

    /// Mutate the state for `key` only if a slot exists.
    pub fn update_existing<R>(
        &self,
        key: Uuid,
        f: impl FnOnce(&mut SessionState) -> R,
    ) -> Option<R> {
        let mut slot = self.slots.get_mut(&key)?;
        slot.touched_at = Instant::now();
        Some(f(&mut slot.state))
    }

    /// Drop everything held for `key` in one step.
    pub fn clear(&self, key: Uuid) {
        self.slots.remove(&key);
    }

    /// Evict slots untouched for longer than `max_idle`, sparing any with an
    /// analysis in flight. Returns the number evicted.
    pub fn sweep(&self, max_idle: Duration) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| {
            slot.touched_at.elapsed() <= max_idle
                || slot.state.phase() == crate::models::Phase::Analyzing
        });
        before.saturating_sub(self.slots.len())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Workspace key of the caller's session, if one was ever issued.
pub async fn current_key(session: &Session) -> Result<Option<Uuid>, tower_sessions::session::Error> {
    session.get::<Uuid>(WORKSPACE_KEY).await
}

/// Workspace key of the caller's session, issuing one if needed.
pub async fn ensure_key(session: &Session) -> Result<Uuid, tower_sessions::session::Error> {
    if let Some(key) = current_key(session).await? {
        return Ok(key);
    }
    let key = Uuid::new_v4();
    session.insert(WORKSPACE_KEY, key).await?;
    Ok(key)
}
