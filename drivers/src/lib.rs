//! Register-mapped Character Device Drivers
//!
//! Drivers that expose a peripheral's register window to user space: the
//! file offset selects a register, `read`/`write` access it, and every
//! register also gets a text attribute file under `/sys/class`.
//!
//! # Module Organization
//!
//! - [`hal`]: width-dispatched register access
//! - [`hw`]: register maps of the supported peripherals
//! - [`regdev`]: the driver core (file protocol, lifecycle, registry, attributes)
//! - [`peripheral`]: per-peripheral descriptions and module init
//! - [`sim`]: simulated register blocks for running on a host
//!
//! # Usage Example
//!
//! ```ignore
//! use drivers::sim::{SimCounter, SimMapper};
//! use kernel::Kernel;
//! use kernel::platform::{PlatformDeviceInfo, Resource};
//!
//! let mapper = Arc::new(SimMapper::new());
//! mapper.place(0x4000_0000, 0x18, Arc::new(SimCounter::new()));
//! let kernel = Kernel::new(mapper);
//! let _modules = drivers::init(&kernel)?;
//!
//! kernel.platform_device_register(
//!     PlatformDeviceInfo::new("counter@0", "test-counter")
//!         .with_resource(Resource::mem(0x4000_0000, 0x18)),
//! )?;
//! let mut file = kernel.open("/dev/test_counter0")?;
//! ```

#![no_std]

extern crate alloc;

pub mod hal;
pub mod hw;
pub mod peripheral;
pub mod regdev;
pub mod sim;

// Re-export commonly used types
pub use regdev::attributes;
pub use regdev::{DeviceDescription, Module, RegisterDriver};

#[cfg(feature = "iob-timer")]
pub use peripheral::iob_timer;
#[cfg(feature = "test-counter")]
pub use peripheral::test_counter;

use alloc::sync::Arc;
use alloc::vec::Vec;
use common::KResult;
use kernel::Kernel;

/// Load every driver built into this crate. Dropping a returned module
/// unloads that driver.
pub fn init(kernel: &Arc<Kernel>) -> KResult<Vec<Module>> {
    let mut modules = Vec::new();
    #[cfg(feature = "test-counter")]
    modules.push(test_counter::init(kernel)?);
    #[cfg(feature = "iob-timer")]
    modules.push(iob_timer::init(kernel)?);
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimMapper;

    #[test]
    fn init_loads_each_enabled_driver() {
        kernel::logger::init(log::LevelFilter::Info);
        let kernel = Kernel::new(Arc::new(SimMapper::new()));
        let modules = init(&kernel).unwrap();
        assert_eq!(
            modules.len(),
            cfg!(feature = "test-counter") as usize + cfg!(feature = "iob-timer") as usize
        );
        assert_eq!(kernel.chrdev_regions().len(), modules.len());
        assert!(
            kernel::logger::dmesg()
                .iter()
                .any(|l| l.ends_with(": initializing"))
        );

        drop(modules);
        assert!(kernel.chrdev_regions().is_empty());
        assert!(kernel.sysfs().list("/sys/class").unwrap().is_empty());
    }
}
