//! Platform bus.
//!
//! Platform devices describe memory-mapped peripherals that cannot be
//! discovered: a `compatible` string plus a list of resources. Drivers
//! register with a match table; whenever a device and a driver match, the
//! driver's `probe` runs. Unregistering either side runs `remove`.
//!
//! Register windows mapped with [`PlatformDevice::devm_ioremap_resource`]
//! are device-managed: the claim on the physical range is dropped exactly
//! once, when the device unbinds (after `remove`, or right after a failed
//! `probe`).

use crate::Kernel;
use crate::io::IoMem;
use alloc::string::{String, ToString};
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use bitflags::bitflags;
use common::sync::SpinLock;
use common::{Errno, KResult};
use core::fmt;

bitflags! {
    /// Resource kind (`IORESOURCE_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ResourceFlags: u32 {
        const IO = 0x0000_0100;
        const MEM = 0x0000_0200;
        const IRQ = 0x0000_0400;
    }
}

/// Inclusive physical range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub start: usize,
    pub end: usize,
    pub flags: ResourceFlags,
}

impl Resource {
    /// Memory resource of `size` bytes at `start`. A zero `size` gives an
    /// empty resource, which cannot be mapped.
    pub const fn mem(start: usize, size: usize) -> Self {
        Self {
            start,
            end: start.wrapping_add(size).wrapping_sub(1),
            flags: ResourceFlags::MEM,
        }
    }

    pub const fn irq(line: usize) -> Self {
        Self {
            start: line,
            end: line,
            flags: ResourceFlags::IRQ,
        }
    }

    /// `resource_size`
    pub const fn size(&self) -> usize {
        self.end.wrapping_sub(self.start).wrapping_add(1)
    }

    fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start <= end && start <= self.end
    }
}

/// Claimed physical range, as listed in `/proc/iomem`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoRegion {
    pub start: usize,
    pub end: usize,
    pub owner: String,
}

/// Claim on a physical range held by a device. Dropping releases it.
struct RegionClaim {
    kernel: Weak<Kernel>,
    start: usize,
}

impl Drop for RegionClaim {
    fn drop(&mut self) {
        if let Some(kernel) = self.kernel.upgrade() {
            kernel.iomem.lock().retain(|r| r.start != self.start);
        }
    }
}

/// Description of a platform device to register.
#[derive(Debug, Clone)]
pub struct PlatformDeviceInfo {
    pub name: String,
    pub compatible: String,
    pub resources: Vec<Resource>,
}

impl PlatformDeviceInfo {
    pub fn new(name: &str, compatible: &str) -> Self {
        Self {
            name: name.to_string(),
            compatible: compatible.to_string(),
            resources: Vec::new(),
        }
    }

    pub fn with_resource(mut self, res: Resource) -> Self {
        self.resources.push(res);
        self
    }
}

pub struct PlatformDevice {
    info: PlatformDeviceInfo,
    kernel: Weak<Kernel>,
    driver: SpinLock<Option<Arc<dyn PlatformDriver>>>,
    devres: SpinLock<Vec<RegionClaim>>,
}

impl PlatformDevice {
    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn compatible(&self) -> &str {
        &self.info.compatible
    }

    /// The `index`-th resource whose kind intersects `flags`
    /// (`platform_get_resource`).
    pub fn get_resource(&self, flags: ResourceFlags, index: usize) -> Option<&Resource> {
        self.info
            .resources
            .iter()
            .filter(|r| r.flags.intersects(flags))
            .nth(index)
    }

    /// Claim and map a memory resource for the lifetime of the binding.
    ///
    /// Fails with `Busy` if any part of the range is already claimed, or
    /// with the mapper's error. A failed mapping leaves no claim behind.
    pub fn devm_ioremap_resource(&self, res: &Resource) -> KResult<IoMem> {
        if !res.flags.contains(ResourceFlags::MEM) || res.end < res.start || res.size() == 0
        {
            return Err(Errno::Inval);
        }
        let kernel = self.kernel.upgrade().ok_or(Errno::NoDev)?;

        {
            let mut iomem = kernel.iomem.lock();
            if iomem.iter().any(|r| res.overlaps(r.start, r.end)) {
                log::warn!(
                    target: "platform",
                    "{}: can't request region for resource [mem {:#010x}-{:#010x}]",
                    self.name(),
                    res.start,
                    res.end
                );
                return Err(Errno::Busy);
            }
            iomem.push(IoRegion {
                start: res.start,
                end: res.end,
                owner: self.name().to_string(),
            });
        }
        let claim = RegionClaim {
            kernel: Arc::downgrade(&kernel),
            start: res.start,
        };

        let io = kernel.mapper.ioremap(res.start, res.size())?;
        self.devres.lock().push(claim);
        Ok(IoMem::new(io, res.start, res.size()))
    }

    /// Name of the bound driver.
    pub fn driver_name(&self) -> Option<&'static str> {
        self.driver.lock().as_ref().map(|d| d.name())
    }

    pub fn is_bound(&self) -> bool {
        self.driver.lock().is_some()
    }

    fn devres_release_all(&self) {
        let claims = core::mem::take(&mut *self.devres.lock());
        drop(claims);
    }
}

impl fmt::Debug for PlatformDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformDevice")
            .field("name", &self.info.name)
            .field("compatible", &self.info.compatible)
            .field("driver", &self.driver_name())
            .finish()
    }
}

/// Driver side of the platform bus.
pub trait PlatformDriver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Compatible strings this driver binds to (`of_match_table`).
    fn of_match_table(&self) -> &'static [&'static str];

    fn probe(&self, pdev: &Arc<PlatformDevice>) -> KResult;

    fn remove(&self, pdev: &Arc<PlatformDevice>);
}

fn matches(driver: &dyn PlatformDriver, pdev: &PlatformDevice) -> bool {
    driver.of_match_table().contains(&pdev.compatible()) || driver.name() == pdev.name()
}

#[derive(Default)]
pub(crate) struct PlatformBus {
    drivers: Vec<Arc<dyn PlatformDriver>>,
    devices: Vec<Arc<PlatformDevice>>,
}

impl PlatformBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

fn bind(driver: &Arc<dyn PlatformDriver>, pdev: &Arc<PlatformDevice>) -> KResult {
    match driver.probe(pdev) {
        Ok(()) => {
            *pdev.driver.lock() = Some(driver.clone());
            Ok(())
        }
        Err(err) => {
            pdev.devres_release_all();
            log::warn!(
                target: "platform",
                "{}: probe of {} failed with error {}",
                driver.name(),
                pdev.name(),
                err.to_raw()
            );
            Err(err)
        }
    }
}

fn unbind(pdev: &Arc<PlatformDevice>) {
    let driver = pdev.driver.lock().take();
    if let Some(driver) = driver {
        driver.remove(pdev);
        pdev.devres_release_all();
    }
}

impl Kernel {
    /// Register a driver and bind it to every matching unbound device.
    ///
    /// A failed probe leaves that device unbound; it does not fail the
    /// registration.
    pub fn platform_driver_register(&self, driver: Arc<dyn PlatformDriver>) -> KResult {
        let candidates: Vec<_> = {
            let mut bus = self.platform.lock();
            if bus.drivers.iter().any(|d| d.name() == driver.name()) {
                return Err(Errno::Busy);
            }
            bus.drivers.push(driver.clone());
            bus.devices
                .iter()
                .filter(|d| !d.is_bound() && matches(driver.as_ref(), d))
                .cloned()
                .collect()
        };
        for pdev in candidates {
            let _ = bind(&driver, &pdev);
        }
        Ok(())
    }

    /// Unbind `name` from all its devices and forget it.
    pub fn platform_driver_unregister(&self, name: &str) {
        let bound: Vec<_> = {
            let mut bus = self.platform.lock();
            bus.drivers.retain(|d| d.name() != name);
            bus.devices
                .iter()
                .filter(|d| d.driver_name() == Some(name))
                .cloned()
                .collect()
        };
        for pdev in bound.iter().rev() {
            unbind(pdev);
        }
    }

    /// Add a device to the bus and probe the first matching driver.
    ///
    /// A failed probe is reported to the caller; the device stays on the
    /// bus, unbound, until it is unregistered.
    pub fn platform_device_register(
        self: &Arc<Self>,
        info: PlatformDeviceInfo,
    ) -> KResult<Arc<PlatformDevice>> {
        let pdev = Arc::new(PlatformDevice {
            info,
            kernel: Arc::downgrade(self),
            driver: SpinLock::new(None),
            devres: SpinLock::new(Vec::new()),
        });
        let driver = {
            let mut bus = self.platform.lock();
            if bus.devices.iter().any(|d| d.name() == pdev.name()) {
                return Err(Errno::Exist);
            }
            bus.devices.push(pdev.clone());
            bus.drivers
                .iter()
                .find(|d| matches(d.as_ref(), &pdev))
                .cloned()
        };
        if let Some(driver) = driver {
            bind(&driver, &pdev)?;
        }
        Ok(pdev)
    }

    /// Remove a device from the bus, unbinding it first.
    pub fn platform_device_unregister(&self, pdev: &Arc<PlatformDevice>) {
        self.platform.lock().devices.retain(|d| !Arc::ptr_eq(d, pdev));
        unbind(pdev);
    }

    /// Currently claimed physical ranges.
    pub fn iomem_regions(&self) -> Vec<IoRegion> {
        self.iomem.lock().clone()
    }
}
