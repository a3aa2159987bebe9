//! Multi-Instance Registry.
//!
//! Live instances in probe order, plus the set of minors handed out. A
//! probe first takes a [`Reservation`] (checked against the capacity
//! before any resource is touched) and commits it once the instance is
//! fully set up; an uncommitted reservation gives its minor back on drop.
//!
//! The list lock is only held for list operations, never across a register
//! access.

use super::instance::DeviceInstance;
use alloc::sync::Arc;
use alloc::vec::Vec;
use common::sync::SpinLock;
use common::{Errno, KResult};
use kernel::chrdev::DevT;

#[derive(Default)]
struct Inner {
    instances: Vec<Arc<DeviceInstance>>,
    minors: Vec<u32>,
}

pub struct Registry {
    capacity: u32,
    inner: SpinLock<Inner>,
}

impl Registry {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            inner: SpinLock::new(Inner::default()),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Take the lowest free minor. `NoDev` once `capacity` are in use.
    pub fn reserve(&self) -> KResult<Reservation<'_>> {
        let mut inner = self.inner.lock();
        let minor = (0..self.capacity)
            .find(|m| !inner.minors.contains(m))
            .ok_or(Errno::NoDev)?;
        inner.minors.push(minor);
        Ok(Reservation {
            registry: self,
            minor,
            committed: false,
        })
    }

    /// Instance behind `dev` (linear scan).
    pub fn find(&self, dev: DevT) -> Option<Arc<DeviceInstance>> {
        self.inner
            .lock()
            .instances
            .iter()
            .find(|i| i.dev() == dev)
            .cloned()
    }

    /// Take `dev` off the list and free its minor.
    pub fn remove(&self, dev: DevT) -> Option<Arc<DeviceInstance>> {
        let mut inner = self.inner.lock();
        let index = inner.instances.iter().position(|i| i.dev() == dev)?;
        let instance = inner.instances.remove(index);
        inner.minors.retain(|m| *m != instance.minor());
        Some(instance)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Minors of the live instances, in probe order.
    pub fn minors(&self) -> Vec<u32> {
        self.inner.lock().instances.iter().map(|i| i.minor()).collect()
    }

    fn unreserve(&self, minor: u32) {
        self.inner.lock().minors.retain(|m| *m != minor);
    }
}

/// A minor held for an instance that is still being probed.
pub struct Reservation<'a> {
    registry: &'a Registry,
    minor: u32,
    committed: bool,
}

impl Reservation<'_> {
    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// Append the finished instance at the tail of the list.
    pub fn commit(mut self, instance: Arc<DeviceInstance>) {
        self.registry.inner.lock().instances.push(instance);
        self.committed = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.registry.unreserve(self.minor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_checked_at_reservation() {
        let registry = Registry::new(2);
        assert_eq!(registry.capacity(), 2);
        let a = registry.reserve().unwrap();
        let b = registry.reserve().unwrap();
        assert_eq!((a.minor(), b.minor()), (0, 1));
        assert_eq!(registry.reserve().err(), Some(Errno::NoDev));

        drop(a);
        assert_eq!(registry.reserve().map(|r| r.minor()).ok(), Some(0));
        assert!(registry.is_empty());
    }
}
