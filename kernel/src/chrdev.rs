//! Character device numbers and `cdev` registrations.
//!
//! A driver first reserves a range of device numbers with
//! [`ChrdevRegion::alloc`], then backs one or more of them with file
//! operations through [`Cdev::add`]. Both return guards; dropping the guard
//! gives the numbers (or the registration) back.

use crate::Kernel;
use crate::fs::file::FileOperations;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use common::{Errno, KResult};
use core::fmt;

pub const MINORBITS: u32 = 20;
pub const MINORMASK: u32 = (1 << MINORBITS) - 1;

/// Dynamic majors are handed out from the top of this range downwards.
const CHRDEV_MAJOR_DYN_START: u32 = 234;
const CHRDEV_MAJOR_DYN_END: u32 = 254;

/// Device number (`dev_t`): 12-bit major, 20-bit minor.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DevT(u32);

impl DevT {
    /// `MKDEV(major, minor)`
    pub const fn new(major: u32, minor: u32) -> Self {
        Self((major << MINORBITS) | (minor & MINORMASK))
    }

    pub const fn major(self) -> u32 {
        self.0 >> MINORBITS
    }

    pub const fn minor(self) -> u32 {
        self.0 & MINORMASK
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The number `n` minors above this one.
    pub const fn offset(self, n: u32) -> Self {
        Self::new(self.major(), self.minor() + n)
    }
}

impl fmt::Debug for DevT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DevT({}:{})", self.major(), self.minor())
    }
}

impl fmt::Display for DevT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major(), self.minor())
    }
}

/// A reserved number range, as listed in `/proc/devices`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionInfo {
    pub first: DevT,
    pub count: u32,
    pub name: String,
}

struct CdevEntry {
    count: u32,
    ops: Arc<dyn FileOperations>,
}

/// Number regions and cdevs known to the kernel.
#[derive(Default)]
pub(crate) struct ChrdevTable {
    regions: Vec<RegionInfo>,
    cdevs: BTreeMap<DevT, CdevEntry>,
}

impl ChrdevTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn alloc_region(&mut self, base_minor: u32, count: u32, name: &str) -> KResult<DevT> {
        if count == 0 || base_minor.checked_add(count).is_none_or(|end| end > MINORMASK) {
            return Err(Errno::Inval);
        }
        let major = (CHRDEV_MAJOR_DYN_START..=CHRDEV_MAJOR_DYN_END)
            .rev()
            .find(|major| self.regions.iter().all(|r| r.first.major() != *major))
            .ok_or(Errno::Busy)?;

        let first = DevT::new(major, base_minor);
        self.regions.push(RegionInfo {
            first,
            count,
            name: name.to_string(),
        });
        Ok(first)
    }

    fn release_region(&mut self, first: DevT) {
        self.regions.retain(|r| r.first != first);
    }

    fn add_cdev(&mut self, dev: DevT, count: u32, ops: Arc<dyn FileOperations>) -> KResult {
        if count == 0 {
            return Err(Errno::Inval);
        }
        let last = dev.offset(count - 1);
        let overlaps = self
            .cdevs
            .range(..=last)
            .next_back()
            .is_some_and(|(start, entry)| start.offset(entry.count - 1) >= dev);
        if overlaps {
            return Err(Errno::Busy);
        }
        self.cdevs.insert(dev, CdevEntry { count, ops });
        Ok(())
    }

    fn del_cdev(&mut self, dev: DevT) {
        self.cdevs.remove(&dev);
    }

    /// File operations backing `dev`, if any cdev covers it.
    pub(crate) fn lookup(&self, dev: DevT) -> Option<Arc<dyn FileOperations>> {
        let (start, entry) = self.cdevs.range(..=dev).next_back()?;
        (start.major() == dev.major() && dev.minor() < start.minor() + entry.count)
            .then(|| entry.ops.clone())
    }

    pub(crate) fn regions(&self) -> Vec<RegionInfo> {
        self.regions.clone()
    }

    pub(crate) fn cdev_count(&self) -> usize {
        self.cdevs.len()
    }
}

/// Reserved device-number range (`alloc_chrdev_region`).
///
/// Dropping it unregisters the range (`unregister_chrdev_region`).
pub struct ChrdevRegion {
    kernel: Arc<Kernel>,
    first: DevT,
    count: u32,
}

impl ChrdevRegion {
    /// Reserve `count` minors starting at `base_minor` under a dynamic major.
    pub fn alloc(kernel: &Arc<Kernel>, base_minor: u32, count: u32, name: &str) -> KResult<Self> {
        let first = kernel.chrdevs.lock().alloc_region(base_minor, count, name)?;
        log::debug!(target: "chrdev", "{}: region {} (+{})", name, first, count);
        Ok(Self {
            kernel: kernel.clone(),
            first,
            count,
        })
    }

    pub fn first(&self) -> DevT {
        self.first
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Device number for the `index`-th minor of the range.
    pub fn dev(&self, index: u32) -> Option<DevT> {
        (index < self.count).then(|| self.first.offset(index))
    }
}

impl Drop for ChrdevRegion {
    fn drop(&mut self) {
        self.kernel.chrdevs.lock().release_region(self.first);
        log::debug!(target: "chrdev", "region {} released", self.first);
    }
}

/// Registered character device (`cdev_add`). Dropping it runs `cdev_del`.
pub struct Cdev {
    kernel: Arc<Kernel>,
    dev: DevT,
}

impl Cdev {
    pub fn add(
        kernel: &Arc<Kernel>,
        dev: DevT,
        count: u32,
        ops: Arc<dyn FileOperations>,
    ) -> KResult<Self> {
        kernel.chrdevs.lock().add_cdev(dev, count, ops)?;
        Ok(Self {
            kernel: kernel.clone(),
            dev,
        })
    }

    pub fn dev(&self) -> DevT {
        self.dev
    }
}

impl Drop for Cdev {
    fn drop(&mut self) {
        self.kernel.chrdevs.lock().del_cdev(self.dev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::DirectMapper;

    struct NoOps;
    impl FileOperations for NoOps {}

    #[test]
    fn devt_packs_major_and_minor() {
        let dev = DevT::new(240, 3);
        assert_eq!(dev.major(), 240);
        assert_eq!(dev.minor(), 3);
        assert_eq!(dev.offset(2), DevT::new(240, 5));
        assert_eq!(alloc::format!("{}", dev), "240:3");
    }

    #[test]
    fn regions_get_distinct_dynamic_majors_and_are_released_on_drop() {
        let kernel = Kernel::new(Arc::new(DirectMapper));
        let a = ChrdevRegion::alloc(&kernel, 0, 2, "a").unwrap();
        let b = ChrdevRegion::alloc(&kernel, 0, 1, "b").unwrap();
        assert_eq!(a.first().major(), CHRDEV_MAJOR_DYN_END);
        assert_ne!(a.first().major(), b.first().major());
        assert_eq!(a.count(), 2);
        assert_eq!(a.dev(1), Some(a.first().offset(1)));
        assert_eq!(a.dev(2), None);
        assert_eq!(kernel.chrdev_regions().len(), 2);

        drop(a);
        drop(b);
        assert!(kernel.chrdev_regions().is_empty());
    }

    #[test]
    fn dynamic_majors_run_out() {
        let kernel = Kernel::new(Arc::new(DirectMapper));
        let held: Vec<_> = (CHRDEV_MAJOR_DYN_START..=CHRDEV_MAJOR_DYN_END)
            .map(|_| ChrdevRegion::alloc(&kernel, 0, 1, "x").unwrap())
            .collect();
        assert_eq!(
            ChrdevRegion::alloc(&kernel, 0, 1, "y").err(),
            Some(Errno::Busy)
        );
        drop(held);
    }

    #[test]
    fn overlapping_cdevs_are_rejected() {
        let kernel = Kernel::new(Arc::new(DirectMapper));
        let first = DevT::new(250, 0);
        let cdev = Cdev::add(&kernel, first, 2, Arc::new(NoOps)).unwrap();
        assert_eq!(
            Cdev::add(&kernel, first.offset(1), 1, Arc::new(NoOps)).err(),
            Some(Errno::Busy)
        );
        let other = Cdev::add(&kernel, first.offset(2), 1, Arc::new(NoOps)).unwrap();

        assert!(kernel.chrdevs.lock().lookup(first.offset(1)).is_some());
        drop(cdev);
        assert!(kernel.chrdevs.lock().lookup(first.offset(1)).is_none());
        assert!(kernel.chrdevs.lock().lookup(other.dev()).is_some());
    }
}
