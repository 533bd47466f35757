//! Read guard serializing reads on the shared configuration.
//!
//! Every read of device configuration, including the read-back that follows
//! a commit, holds a [`ReadPermit`] from the moment the show command is sent
//! until its reply is parsed. Writes are serialized by the device lock and
//! do not take the guard.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::trace;

/// Shared read lock, created once and handed to every reconciler.
#[derive(Debug, Clone, Default)]
pub struct ReadGuard {
    inner: Arc<Mutex<()>>,
}

/// Scoped permit; the guard is released when it drops.
#[derive(Debug)]
pub struct ReadPermit<'a> {
    _permit: MutexGuard<'a, ()>,
}

impl ReadGuard {
    /// Creates a new, unlocked guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive read access.
    pub async fn acquire(&self) -> ReadPermit<'_> {
        let permit = self.inner.lock().await;
        trace!("Read guard acquired");
        ReadPermit { _permit: permit }
    }

    /// Returns true if a permit is currently held.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}
