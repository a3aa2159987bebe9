//! Register maps.
//!
//! A peripheral's register window is a table of fixed, non-overlapping
//! slots. Decoding a file offset or an attribute name is one lookup in
//! that table.

use crate::hal::regs::Width;
use bitflags::bitflags;

bitflags! {
    /// Direction of a register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Access: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const RW = Self::READ.bits() | Self::WRITE.bits();
    }
}

/// How a write lands on the register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Kind {
    /// The written value is stored as is.
    Plain,
    /// Assert (1) then immediately deassert (0), whatever was written.
    Pulse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterDescriptor {
    pub name: &'static str,
    pub addr: usize,
    pub width: Width,
    pub access: Access,
    pub kind: Kind,
}

impl RegisterDescriptor {
    pub const fn read_only(name: &'static str, addr: usize, width: Width) -> Self {
        Self {
            name,
            addr,
            width,
            access: Access::READ,
            kind: Kind::Plain,
        }
    }

    pub const fn write_only(name: &'static str, addr: usize, width: Width) -> Self {
        Self {
            name,
            addr,
            width,
            access: Access::WRITE,
            kind: Kind::Plain,
        }
    }

    pub const fn read_write(name: &'static str, addr: usize, width: Width) -> Self {
        Self {
            name,
            addr,
            width,
            access: Access::RW,
            kind: Kind::Plain,
        }
    }

    /// Write-only strobe register.
    pub const fn pulse(name: &'static str, addr: usize, width: Width) -> Self {
        Self {
            name,
            addr,
            width,
            access: Access::WRITE,
            kind: Kind::Pulse,
        }
    }

    pub fn is_readable(&self) -> bool {
        self.access.contains(Access::READ)
    }

    pub fn is_writable(&self) -> bool {
        self.access.contains(Access::WRITE)
    }

    /// One past the last byte of the slot.
    pub const fn end(&self) -> usize {
        self.addr + self.width.bytes()
    }
}

/// Static register table of one peripheral.
#[derive(Debug)]
pub struct RegisterMap {
    registers: &'static [RegisterDescriptor],
}

impl RegisterMap {
    pub const fn new(registers: &'static [RegisterDescriptor]) -> Self {
        Self { registers }
    }

    /// The register whose slot starts exactly at `addr`.
    pub fn lookup(&self, addr: usize) -> Option<&'static RegisterDescriptor> {
        self.registers.iter().find(|r| r.addr == addr)
    }

    pub fn by_name(&self, name: &str) -> Option<&'static RegisterDescriptor> {
        self.registers.iter().find(|r| r.name == name)
    }

    /// Bytes a mapped window must cover to reach every register.
    pub fn span(&self) -> usize {
        self.registers.iter().map(RegisterDescriptor::end).max().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static RegisterDescriptor> {
        self.registers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static REGS: [RegisterDescriptor; 3] = [
        RegisterDescriptor::read_only("ID", 0x0, Width::W32),
        RegisterDescriptor::pulse("RST", 0x4, Width::W8),
        RegisterDescriptor::read_write("CTRL", 0x6, Width::W16),
    ];
    static MAP: RegisterMap = RegisterMap::new(&REGS);

    #[test]
    fn lookup_matches_slot_start_only() {
        assert_eq!(MAP.lookup(0x4).map(|r| r.name), Some("RST"));
        assert!(MAP.lookup(0x1).is_none());
        assert!(MAP.lookup(0x8).is_none());
        assert_eq!(MAP.by_name("CTRL").map(|r| r.addr), Some(0x6));
    }

    #[test]
    fn directions_and_span() {
        let rst = MAP.by_name("RST").unwrap();
        assert!(rst.is_writable() && !rst.is_readable());
        assert_eq!(rst.kind, Kind::Pulse);
        assert!(MAP.by_name("CTRL").unwrap().is_readable());
        assert_eq!(MAP.span(), 0x8);
    }
}
