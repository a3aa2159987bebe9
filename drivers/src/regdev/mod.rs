//! Register-mapped character device driver core.
//!
//! One [`RegisterDriver`] serves every peripheral described by a static
//! [`DeviceDescription`]. Module init reserves a device-number region
//! (one minor per possible instance), creates the device class and
//! registers the platform driver. Each probe then builds one instance:
//!
//! ```text
//! minor reservation -> I/O resource -> ioremap -> cdev -> device node -> attribute files
//! ```
//!
//! Every step returns a guard, so a failure at any step drops exactly what
//! the earlier steps acquired, in reverse. `remove` drops the same guards
//! in the same reverse order; the mapped region itself is device-managed
//! and released by the platform bus afterwards.

pub mod attributes;
pub mod file;
pub mod instance;
pub mod registry;

use crate::hw::regmap::RegisterMap;
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use attributes::{AttributeSpec, RegisterAttribute};
use common::sync::SpinLock;
use common::{Errno, KResult};
use file::RegisterFileOps;
use instance::DeviceInstance;
use kernel::Kernel;
use kernel::chrdev::{Cdev, ChrdevRegion, DevT};
use kernel::device::{AttributeFile, Class, DeviceNode};
use kernel::platform::{PlatformDevice, PlatformDriver, ResourceFlags};
use registry::Registry;

/// Static description of a register-mapped peripheral.
#[derive(Debug)]
pub struct DeviceDescription {
    /// Driver name; also the base name of the device nodes.
    pub name: &'static str,
    pub class: &'static str,
    pub compatible: &'static [&'static str],
    pub map: &'static RegisterMap,
    pub attributes: &'static [AttributeSpec],
    /// Maximum number of instances.
    pub capacity: u32,
    /// Name nodes `<name><minor>` rather than `<name>`.
    pub minor_suffix: bool,
}

impl DeviceDescription {
    pub fn node_name(&self, minor: u32) -> String {
        if self.minor_suffix {
            format!("{}{}", self.name, minor)
        } else {
            self.name.to_string()
        }
    }
}

/// Everything one probe set up, torn down in reverse on drop.
struct InstanceResources {
    instance: Arc<DeviceInstance>,
    attrs: Vec<AttributeFile>,
    node: DeviceNode,
    _cdev: Cdev,
}

impl Drop for InstanceResources {
    fn drop(&mut self) {
        while let Some(attr) = self.attrs.pop() {
            drop(attr);
        }
    }
}

pub struct RegisterDriver {
    desc: &'static DeviceDescription,
    kernel: Arc<Kernel>,
    first: DevT,
    class: Class,
    registry: Arc<Registry>,
    ops: Arc<RegisterFileOps>,
    bound: SpinLock<BTreeMap<String, InstanceResources>>,
}

impl RegisterDriver {
    fn new(kernel: &Arc<Kernel>, desc: &'static DeviceDescription, first: DevT, class: Class) -> Self {
        let registry = Arc::new(Registry::new(desc.capacity));
        Self {
            desc,
            kernel: kernel.clone(),
            first,
            class,
            ops: Arc::new(RegisterFileOps::new(registry.clone())),
            registry,
            bound: SpinLock::new(BTreeMap::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Instance bound to `pdev`, if probed.
    pub fn instance(&self, pdev: &PlatformDevice) -> Option<Arc<DeviceInstance>> {
        self.bound
            .lock()
            .get(pdev.name())
            .map(|r| r.instance.clone())
    }

    fn setup(&self, pdev: &Arc<PlatformDevice>) -> KResult<InstanceResources> {
        let name = self.desc.name;
        let slot = self.registry.reserve().inspect_err(|_| {
            log::error!(target: name, "too many devices");
        })?;

        let res = *pdev.get_resource(ResourceFlags::MEM, 0).ok_or_else(|| {
            log::error!(target: name, "Failed to get I/O resource!");
            Errno::NoDev
        })?;
        let regs = pdev.devm_ioremap_resource(&res)?;
        if regs.size() < self.desc.map.span() {
            log::error!(
                target: name,
                "{}: register window of {:#x} bytes is smaller than {:#x}",
                pdev.name(),
                regs.size(),
                self.desc.map.span()
            );
            return Err(Errno::Inval);
        }

        let dev = self.first.offset(slot.minor());
        let instance = Arc::new(DeviceInstance::new(self.desc, dev, regs));

        let cdev = Cdev::add(&self.kernel, dev, 1, self.ops.clone()).inspect_err(|_| {
            log::error!(target: name, "Char device registration failed!");
        })?;
        let node = DeviceNode::create(
            &self.kernel,
            &self.class,
            dev,
            &self.desc.node_name(slot.minor()),
        )
        .inspect_err(|_| log::error!(target: name, "Can not create device file!"))?;

        let mut resources = InstanceResources {
            instance: instance.clone(),
            attrs: Vec::with_capacity(self.desc.attributes.len()),
            node,
            _cdev: cdev,
        };
        for spec in self.desc.attributes {
            let ops = Arc::new(RegisterAttribute::new(instance.clone(), spec.source));
            let file = resources
                .node
                .create_file(spec.attr, ops)
                .inspect_err(|_| log::error!(target: name, "Cannot create device attribute file"))?;
            resources.attrs.push(file);
        }

        slot.commit(instance);
        Ok(resources)
    }
}

impl PlatformDriver for RegisterDriver {
    fn name(&self) -> &'static str {
        self.desc.name
    }

    fn of_match_table(&self) -> &'static [&'static str] {
        self.desc.compatible
    }

    fn probe(&self, pdev: &Arc<PlatformDevice>) -> KResult {
        log::info!(target: self.desc.name, "probing {}", pdev.name());
        let resources = self.setup(pdev)?;
        let minor = resources.instance.minor();
        self.bound.lock().insert(pdev.name().to_string(), resources);
        log::info!(target: self.desc.name, "{}: initialized with minor {}", pdev.name(), minor);
        Ok(())
    }

    fn remove(&self, pdev: &Arc<PlatformDevice>) {
        let resources = self.bound.lock().remove(pdev.name());
        let Some(resources) = resources else {
            return;
        };
        let dev = resources.instance.dev();
        drop(resources);
        if let Some(instance) = self.registry.remove(dev) {
            instance.retire();
        }
        log::info!(target: self.desc.name, "{}: remove", pdev.name());
    }
}

/// A loaded driver module. Dropping it runs module exit.
pub struct Module {
    kernel: Arc<Kernel>,
    driver: Arc<RegisterDriver>,
    region: ChrdevRegion,
}

impl Module {
    pub fn driver(&self) -> &Arc<RegisterDriver> {
        &self.driver
    }

    /// First device number of the module's region.
    pub fn first_dev(&self) -> DevT {
        self.region.first()
    }
}

impl Drop for Module {
    fn drop(&mut self) {
        let name = self.driver.desc.name;
        log::info!(target: name, "exiting");
        self.kernel.platform_driver_unregister(name);
    }
}

/// Module init: region, class, platform driver.
pub fn init(kernel: &Arc<Kernel>, desc: &'static DeviceDescription) -> KResult<Module> {
    log::info!(target: desc.name, "initializing");
    let region = ChrdevRegion::alloc(kernel, 0, desc.capacity, desc.name).inspect_err(|_| {
        log::error!(target: desc.name, "Failed to allocate device number!");
    })?;
    let class = Class::create(kernel, desc.class).inspect_err(|_| {
        log::error!(target: desc.name, "Device class can not be created!");
    })?;
    let driver = Arc::new(RegisterDriver::new(kernel, desc, region.first(), class));
    kernel
        .platform_driver_register(driver.clone())
        .inspect_err(|_| log::error!(target: desc.name, "Failed to register platform driver!"))?;

    Ok(Module {
        kernel: kernel.clone(),
        driver,
        region,
    })
}
