//! IOb timer register map.
//!
//! The timer counts clock cycles while `ENABLE` is set and `RESET` is
//! clear. Writing `SAMPLE` latches the 64-bit count into
//! `DATA_HIGH:DATA_LOW`.

use super::regmap::{RegisterDescriptor, RegisterMap};
use crate::hal::regs::Width;

pub const REG_RESET: usize = 0;
pub const REG_ENABLE: usize = 1;
pub const REG_SAMPLE: usize = 2;
pub const REG_DATA_LOW: usize = 4;
pub const REG_DATA_HIGH: usize = 8;
pub const REG_VERSION: usize = 12;

pub const WINDOW_SIZE: usize = 16;

static REGISTERS: [RegisterDescriptor; 6] = [
    RegisterDescriptor::write_only("RESET", REG_RESET, Width::W8),
    RegisterDescriptor::write_only("ENABLE", REG_ENABLE, Width::W8),
    RegisterDescriptor::write_only("SAMPLE", REG_SAMPLE, Width::W8),
    RegisterDescriptor::read_only("DATA_LOW", REG_DATA_LOW, Width::W32),
    RegisterDescriptor::read_only("DATA_HIGH", REG_DATA_HIGH, Width::W32),
    RegisterDescriptor::read_only("VERSION", REG_VERSION, Width::W16),
];

pub static MAP: RegisterMap = RegisterMap::new(&REGISTERS);
