use super::DeviceDescription;
use crate::hal::regs::{read_register, write_register};
use crate::hw::regmap::{Kind, RegisterDescriptor, RegisterMap};
use common::sync::{ExclusiveLock, SpinLock};
use common::{Errno, KResult};
use kernel::chrdev::DevT;
use kernel::io::IoMem;

/// State of one probed device, shared by the driver and every open handle.
///
/// The register window is taken away by [`retire`](Self::retire) when the
/// device is removed; accesses after that fail with `NoDev`.
pub struct DeviceInstance {
    desc: &'static DeviceDescription,
    dev: DevT,
    window: usize,
    regs: SpinLock<Option<IoMem>>,
    gate: ExclusiveLock,
}

impl DeviceInstance {
    pub(crate) fn new(desc: &'static DeviceDescription, dev: DevT, regs: IoMem) -> Self {
        Self {
            desc,
            dev,
            window: regs.size(),
            regs: SpinLock::new(Some(regs)),
            gate: ExclusiveLock::new(),
        }
    }

    pub fn dev(&self) -> DevT {
        self.dev
    }

    pub fn minor(&self) -> u32 {
        self.dev.minor()
    }

    /// Size of the register window; the file offset never exceeds it.
    pub fn window_size(&self) -> usize {
        self.window
    }

    pub fn map(&self) -> &'static RegisterMap {
        self.desc.map
    }

    pub fn name(&self) -> &'static str {
        self.desc.name
    }

    /// Exclusivity gate held by the open handle.
    pub fn gate(&self) -> &ExclusiveLock {
        &self.gate
    }

    pub fn is_live(&self) -> bool {
        self.regs.lock().is_some()
    }

    fn regs(&self) -> KResult<IoMem> {
        self.regs.lock().clone().ok_or(Errno::NoDev)
    }

    /// Read `reg` with its own width.
    pub fn read(&self, reg: &RegisterDescriptor) -> KResult<u32> {
        let regs = self.regs()?;
        let value = read_register(regs.io(), reg.addr, reg.width);
        log::debug!(target: self.desc.name, "read {} = {:#x}", reg.name, value);
        Ok(value)
    }

    /// Write `reg` with its own width. Pulse registers get 1 then 0 and
    /// `value` is ignored.
    pub fn write(&self, reg: &RegisterDescriptor, value: u32) -> KResult {
        let regs = self.regs()?;
        match reg.kind {
            Kind::Plain => {
                write_register(regs.io(), reg.addr, value, reg.width);
                log::debug!(target: self.desc.name, "write {} = {:#x}", reg.name, value);
            }
            Kind::Pulse => {
                write_register(regs.io(), reg.addr, 1, reg.width);
                write_register(regs.io(), reg.addr, 0, reg.width);
                log::debug!(target: self.desc.name, "pulse {}", reg.name);
            }
        }
        Ok(())
    }

    pub(crate) fn retire(&self) {
        self.regs.lock().take();
    }
}
