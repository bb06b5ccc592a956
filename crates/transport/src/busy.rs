//! The single in-flight network operation guard.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "a network round trip is in progress" flag.
///
/// Clones observe the same flag. Only one [`BusyGuard`] can exist at a time.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag {
    inner: Arc<AtomicBool>,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }

    /// Marks the flag busy, or returns `None` if it already is.
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.inner
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard {
                inner: Arc::clone(&self.inner),
            })
    }
}

/// Clears the busy flag when dropped.
#[derive(Debug)]
pub struct BusyGuard {
    inner: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.inner.store(false, Ordering::Release);
    }
}
