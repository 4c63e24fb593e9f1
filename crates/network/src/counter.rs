//! Active connection counting
//!
//! The gate only reads the count (capacity checks, live MOTD numbers). The
//! listener owns a [`ServiceCounter`] per service and holds an
//! [`OnlineGuard`] for every login session it relays.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Read-only view of a live connection count
///
/// A slightly stale value is acceptable: the count is read without any
/// coordination with the sessions being opened or closed.
pub trait ActiveCount: Send + Sync {
    fn active(&self) -> usize;
}

impl<F> ActiveCount for F
where
    F: Fn() -> usize + Send + Sync,
{
    fn active(&self) -> usize {
        self()
    }
}

/// Per-service count of relayed login sessions
#[derive(Debug, Default)]
pub struct ServiceCounter {
    active: AtomicUsize,
}

impl ServiceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a session until the returned guard is dropped
    pub fn enter(self: &Arc<Self>) -> OnlineGuard {
        self.active.fetch_add(1, Ordering::Relaxed);
        OnlineGuard {
            counter: Arc::clone(self),
        }
    }
}

impl ActiveCount for ServiceCounter {
    fn active(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }
}

/// Keeps one session counted while alive
#[derive(Debug)]
pub struct OnlineGuard {
    counter: Arc<ServiceCounter>,
}

impl Drop for OnlineGuard {
    fn drop(&mut self) {
        self.counter.active.fetch_sub(1, Ordering::Relaxed);
    }
}
