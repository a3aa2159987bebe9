//! Host-kernel services for character-device drivers.
//!
//! A [`Kernel`] owns every table a driver touches: device-number regions and
//! cdevs, the `/dev` and `/sys` trees, claimed I/O memory and the platform
//! bus. The register backend is injected at construction through an
//! [`IoMapper`](io::IoMapper), so the same drivers run on real MMIO or on
//! simulated register blocks.

#![no_std]

extern crate alloc;

pub mod chrdev;
pub mod device;
pub mod fs;
pub mod io;
pub mod logger;
pub mod platform;
pub mod uaccess;

use alloc::sync::Arc;
use alloc::vec::Vec;
use chrdev::{ChrdevTable, RegionInfo};
use common::sync::SpinLock;
use common::{Errno, KResult};
use fs::{DevFs, File, SysFs};
use io::IoMapper;
use platform::{IoRegion, PlatformBus};

pub struct Kernel {
    pub(crate) mapper: Arc<dyn IoMapper>,
    pub(crate) chrdevs: SpinLock<ChrdevTable>,
    pub(crate) devfs: DevFs,
    pub(crate) sysfs: SysFs,
    pub(crate) iomem: SpinLock<Vec<IoRegion>>,
    pub(crate) platform: SpinLock<PlatformBus>,
}

impl Kernel {
    pub fn new(mapper: Arc<dyn IoMapper>) -> Arc<Self> {
        Arc::new(Self {
            mapper,
            chrdevs: SpinLock::new(ChrdevTable::new()),
            devfs: DevFs::new(),
            sysfs: SysFs::new(),
            iomem: SpinLock::new(Vec::new()),
            platform: SpinLock::new(PlatformBus::new()),
        })
    }

    pub fn devfs(&self) -> &DevFs {
        &self.devfs
    }

    pub fn sysfs(&self) -> &SysFs {
        &self.sysfs
    }

    /// Reserved device-number regions (`/proc/devices`).
    pub fn chrdev_regions(&self) -> Vec<RegionInfo> {
        self.chrdevs.lock().regions()
    }

    /// Number of live cdev registrations.
    pub fn cdev_count(&self) -> usize {
        self.chrdevs.lock().cdev_count()
    }

    /// Open a device node by path, e.g. `/dev/iob_timer`.
    pub fn open(&self, path: &str) -> KResult<File> {
        let name = path.strip_prefix("/dev/").ok_or(Errno::NoEnt)?;
        let rdev = self.devfs.lookup(name).ok_or(Errno::NoEnt)?;
        let ops = self.chrdevs.lock().lookup(rdev).ok_or(Errno::NoDev)?;

        let mut file = File::new(rdev, ops.clone());
        ops.open(&mut file)?;
        file.mark_opened();
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chrdev::{Cdev, DevT};
    use crate::fs::FileOperations;
    use crate::io::DirectMapper;

    struct Refuse;

    impl FileOperations for Refuse {
        fn open(&self, _file: &mut File) -> KResult {
            Err(Errno::Busy)
        }
    }

    #[test]
    fn open_resolves_node_then_cdev() {
        let kernel = Kernel::new(Arc::new(DirectMapper));
        assert_eq!(kernel.open("/dev/missing").err(), Some(Errno::NoEnt));
        assert_eq!(kernel.open("relative").err(), Some(Errno::NoEnt));

        let dev = DevT::new(250, 0);
        kernel.devfs.add("node", dev).unwrap();
        assert_eq!(kernel.open("/dev/node").err(), Some(Errno::NoDev));

        let _cdev = Cdev::add(&kernel, dev, 1, Arc::new(Refuse)).unwrap();
        assert_eq!(kernel.cdev_count(), 1);
        assert_eq!(kernel.open("/dev/node").err(), Some(Errno::Busy));
    }
}
