//! Position-Addressed File Protocol.
//!
//! The file offset is the register address. `read` and `write` decode the
//! current offset through the register map and perform one access of the
//! register's width; `llseek` keeps the offset inside `[0, window]`.
//! Offsets with no matching register read and write zero bytes.

use super::instance::DeviceInstance;
use super::registry::Registry;
use alloc::sync::Arc;
use common::{Errno, KResult};
use kernel::fs::{File, FileOperations, SeekWhence};
use kernel::uaccess::{UserSliceReader, UserSliceWriter};

pub struct RegisterFileOps {
    registry: Arc<Registry>,
}

impl RegisterFileOps {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

fn instance(file: &File) -> KResult<Arc<DeviceInstance>> {
    file.private_data::<DeviceInstance>().ok_or(Errno::NoDev)
}

impl FileOperations for RegisterFileOps {
    fn open(&self, file: &mut File) -> KResult {
        let instance = self.registry.find(file.rdev()).ok_or(Errno::NoDev)?;
        if !instance.gate().try_acquire() {
            log::info!(target: instance.name(), "Another process is accessing the device");
            return Err(Errno::Busy);
        }
        log::debug!(target: instance.name(), "device {} opened", file.rdev());
        file.set_private_data(instance);
        Ok(())
    }

    fn release(&self, file: &mut File) {
        if let Ok(instance) = instance(file) {
            instance.gate().release();
        }
    }

    fn read(&self, file: &File, buf: &mut UserSliceWriter<'_>, pos: &mut i64) -> KResult<usize> {
        let instance = instance(file)?;
        let reg = usize::try_from(*pos)
            .ok()
            .and_then(|addr| instance.map().lookup(addr))
            .filter(|r| r.is_readable());
        let Some(reg) = reg else {
            return Ok(0);
        };

        let size = reg.width.bytes().min(buf.len());
        if size == 0 {
            return Ok(0);
        }
        let value = instance.read(reg)?;
        buf.write_slice(&value.to_le_bytes()[..size])?;
        *pos += size as i64;
        Ok(size)
    }

    fn write(&self, file: &File, buf: &mut UserSliceReader<'_>, pos: &mut i64) -> KResult<usize> {
        let instance = instance(file)?;
        let reg = usize::try_from(*pos)
            .ok()
            .and_then(|addr| instance.map().lookup(addr))
            .filter(|r| r.is_writable());
        let Some(reg) = reg else {
            log::info!(target: instance.name(), "Invalid write address {:#x}", *pos);
            return Ok(0);
        };

        let size = reg.width.bytes().min(buf.len());
        if size == 0 {
            return Ok(0);
        }
        let mut bytes = [0u8; 4];
        buf.read_slice(&mut bytes[..size])?;
        instance.write(reg, u32::from_le_bytes(bytes))?;
        Ok(size)
    }

    fn llseek(&self, file: &mut File, offset: i64, whence: SeekWhence) -> KResult<i64> {
        let instance = instance(file)?;
        let window = instance.window_size() as i64;
        let new_pos = match whence {
            SeekWhence::Start => Some(offset),
            SeekWhence::Current => file.pos().checked_add(offset),
            SeekWhence::End => window.checked_add(offset),
        }
        .ok_or(Errno::Inval)?;

        if !(0..=window).contains(&new_pos) {
            return Err(Errno::Inval);
        }
        file.set_pos(new_pos);
        Ok(new_pos)
    }
}
