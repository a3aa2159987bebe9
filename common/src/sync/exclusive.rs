//! Single-holder lock that is not tied to a guard's scope.
//!
//! A device file is opened in one call and released in another, so the
//! lock taken at open time cannot live in a stack guard. `ExclusiveLock`
//! keeps only the "held" bit: [`try_acquire`](ExclusiveLock::try_acquire)
//! never spins and [`release`](ExclusiveLock::release) always clears it.

use core::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct ExclusiveLock {
    held: AtomicBool,
}

impl ExclusiveLock {
    pub const fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
        }
    }

    /// Takes the lock if it is free. Returns `false` when someone holds it.
    pub fn try_acquire(&self) -> bool {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Unconditionally unlocks. A release without a matching acquire is
    /// not detected.
    pub fn release(&self) {
        self.held.store(false, Ordering::Release);
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_rejected_until_release() {
        let lock = ExclusiveLock::new();
        assert!(lock.try_acquire());
        assert!(!lock.try_acquire());
        assert!(lock.is_held());

        lock.release();
        assert!(!lock.is_held());
        assert!(lock.try_acquire());
    }

    #[test]
    fn release_without_acquire_leaves_lock_free() {
        let lock = ExclusiveLock::new();
        lock.release();
        assert!(lock.try_acquire());
    }
}
