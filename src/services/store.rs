//! Store — the single writer of `HubState`.
//!
//! DESIGN
//! ======
//! Every mutation is a closure over `&mut HubState` applied under one lock,
//! so it always computes from the latest state, never from a snapshot taken
//! before an await. After a mutation reports a change, the new snapshot is
//! published on a `watch` channel while the lock is still held, which keeps
//! published snapshots in commit order.
//!
//! Async tasks (broadcast replies) never hold a widget; they hold an id and
//! commit through `update` when they finish.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::state::HubState;

/// Whether a mutation result altered the state.
pub trait Changed {
    fn changed(&self) -> bool;
}

impl Changed for bool {
    fn changed(&self) -> bool {
        *self
    }
}

impl<T> Changed for Option<T> {
    fn changed(&self) -> bool {
        self.is_some()
    }
}

impl<T, E> Changed for Result<T, E> {
    fn changed(&self) -> bool {
        self.is_ok()
    }
}

struct Inner {
    state: Mutex<HubState>,
    published: watch::Sender<Arc<HubState>>,
}

/// Owning controller for the workspace tree. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl Store {
    #[must_use]
    pub fn new(initial: HubState) -> Self {
        let (published, _) = watch::channel(Arc::new(initial.clone()));
        Self { inner: Arc::new(Inner { state: Mutex::new(initial), published }) }
    }

    /// Apply `mutate` atomically. Observers are notified only when the result reports a change.
    pub fn update<R, F>(&self, mutate: F) -> R
    where
        R: Changed,
        F: FnOnce(&mut HubState) -> R,
    {
        let mut state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let result = mutate(&mut state);
        if result.changed() {
            self.inner.published.send_replace(Arc::new(state.clone()));
        }
        result
    }

    /// Read from the latest state without publishing.
    pub fn read<R>(&self, f: impl FnOnce(&HubState) -> R) -> R {
        let state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&state)
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<HubState> {
        self.inner.published.borrow().clone()
    }

    /// Subscribe to snapshots. The receiver starts at the current one.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<HubState>> {
        self.inner.published.subscribe()
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
