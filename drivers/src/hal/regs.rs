//! Register Access Layer.
//!
//! Width-dispatched reads and writes over a mapped register window. The
//! width must be the one the register map defines for `addr`; a mismatch
//! is a programming error and is not checked here.

use kernel::io::RegisterIo;

/// Access width of a register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Width {
    W8,
    W16,
    W32,
}

impl Width {
    pub const fn bits(self) -> u32 {
        match self {
            Width::W8 => 8,
            Width::W16 => 16,
            Width::W32 => 32,
        }
    }

    pub const fn bytes(self) -> usize {
        (self.bits() / 8) as usize
    }

    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(Width::W8),
            16 => Some(Width::W16),
            32 => Some(Width::W32),
            _ => None,
        }
    }

    /// Largest value the register can hold.
    pub const fn max_value(self) -> u32 {
        match self {
            Width::W8 => u8::MAX as u32,
            Width::W16 => u16::MAX as u32,
            Width::W32 => u32::MAX,
        }
    }
}

/// `ioread8/16/32(base + addr)`, zero-extended.
#[inline]
pub fn read_register(io: &dyn RegisterIo, addr: usize, width: Width) -> u32 {
    match width {
        Width::W8 => io.read8(addr) as u32,
        Width::W16 => io.read16(addr) as u32,
        Width::W32 => io.read32(addr),
    }
}

/// `iowrite8/16/32(value, base + addr)`. Bits above `width` are dropped.
#[inline]
pub fn write_register(io: &dyn RegisterIo, addr: usize, value: u32, width: Width) {
    match width {
        Width::W8 => io.write8(addr, value as u8),
        Width::W16 => io.write16(addr, value as u16),
        Width::W32 => io.write32(addr, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::io::Mmio;

    #[test]
    fn width_conversions() {
        assert_eq!(Width::from_bits(16), Some(Width::W16));
        assert_eq!(Width::from_bits(64), None);
        assert_eq!(Width::W32.bytes(), 4);
        assert_eq!(Width::W8.max_value(), 0xff);
    }

    #[test]
    fn accesses_use_the_requested_width() {
        let mut backing = [0u32; 2];
        let io = unsafe { Mmio::new(backing.as_mut_ptr() as usize, 8) };

        write_register(&io, 0, 0xAABB_CCDD, Width::W32);
        write_register(&io, 4, 0x1_2345, Width::W16);
        write_register(&io, 6, 0x1FF, Width::W8);

        assert_eq!(read_register(&io, 0, Width::W8), 0xDD);
        assert_eq!(read_register(&io, 0, Width::W16), 0xCCDD);
        assert_eq!(read_register(&io, 0, Width::W32), 0xAABB_CCDD);
        assert_eq!(backing[1], 0x00FF_2345);
    }
}
