//! Register I/O primitives.
//!
//! [`RegisterIo`] is the byte/halfword/word access surface of one mapped
//! register window (`ioread8`/`iowrite32` and friends). [`Mmio`] performs
//! those accesses with volatile loads and stores on an identity-mapped
//! physical window; anything else implementing the trait (a simulated
//! register block, for instance) can be handed out by an [`IoMapper`].

use alloc::sync::Arc;
use common::{Errno, KResult};
use core::fmt;
use core::ptr::{read_volatile, write_volatile};

/// Width-specific accessors over a register window.
///
/// `offset` is a byte offset from the start of the window. Callers only
/// pass offsets that lie inside the window and match the width the
/// hardware defines for that register.
pub trait RegisterIo: Send + Sync {
    fn read8(&self, offset: usize) -> u8;
    fn read16(&self, offset: usize) -> u16;
    fn read32(&self, offset: usize) -> u32;
    fn write8(&self, offset: usize, value: u8);
    fn write16(&self, offset: usize, value: u16);
    fn write32(&self, offset: usize, value: u32);
}

/// Volatile MMIO window.
pub struct Mmio {
    base: usize,
    size: usize,
}

impl Mmio {
    /// Create an accessor for `size` bytes of device memory at `base`.
    ///
    /// # Safety
    ///
    /// - `base..base + size` must be mapped as device memory
    /// - Nothing else may treat that range as ordinary memory
    pub const unsafe fn new(base: usize, size: usize) -> Self {
        Self { base, size }
    }

    #[inline]
    fn addr(&self, offset: usize, width: usize) -> usize {
        debug_assert!(offset + width <= self.size, "MMIO access out of window");
        self.base + offset
    }
}

impl RegisterIo for Mmio {
    #[inline]
    fn read8(&self, offset: usize) -> u8 {
        unsafe { read_volatile(self.addr(offset, 1) as *const u8) }
    }

    #[inline]
    fn read16(&self, offset: usize) -> u16 {
        unsafe { read_volatile(self.addr(offset, 2) as *const u16) }
    }

    #[inline]
    fn read32(&self, offset: usize) -> u32 {
        unsafe { read_volatile(self.addr(offset, 4) as *const u32) }
    }

    #[inline]
    fn write8(&self, offset: usize, value: u8) {
        unsafe { write_volatile(self.addr(offset, 1) as *mut u8, value) }
    }

    #[inline]
    fn write16(&self, offset: usize, value: u16) {
        unsafe { write_volatile(self.addr(offset, 2) as *mut u16, value) }
    }

    #[inline]
    fn write32(&self, offset: usize, value: u32) {
        unsafe { write_volatile(self.addr(offset, 4) as *mut u32, value) }
    }
}

/// A mapped register window: the accessor plus the physical range it covers.
#[derive(Clone)]
pub struct IoMem {
    io: Arc<dyn RegisterIo>,
    start: usize,
    size: usize,
}

impl IoMem {
    pub fn new(io: Arc<dyn RegisterIo>, start: usize, size: usize) -> Self {
        Self { io, start, size }
    }

    /// Byte length of the window.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn io(&self) -> &dyn RegisterIo {
        self.io.as_ref()
    }
}

impl fmt::Debug for IoMem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoMem")
            .field("start", &format_args!("{:#x}", self.start))
            .field("size", &self.size)
            .finish()
    }
}

/// Turns a physical register range into an accessor (`ioremap`).
pub trait IoMapper: Send + Sync {
    fn ioremap(&self, start: usize, size: usize) -> KResult<Arc<dyn RegisterIo>>;
}

/// Mapper for identity-mapped device memory.
pub struct DirectMapper;

impl IoMapper for DirectMapper {
    fn ioremap(&self, start: usize, size: usize) -> KResult<Arc<dyn RegisterIo>> {
        if start == 0 || size == 0 {
            return Err(Errno::NoMem);
        }
        Ok(Arc::new(unsafe { Mmio::new(start, size) }))
    }
}
