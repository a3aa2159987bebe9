//! Counter peripheral register map.
//!
//! | Offset | Name   | Width | Dir | Effect                          |
//! |--------|--------|-------|-----|---------------------------------|
//! | 0x00   | ID     | 32    | R   | device identifier               |
//! | 0x04   | RST    | 8     | W   | pulse: clear the counter        |
//! | 0x08   | INCR   | 8     | W   | increment the counter           |
//! | 0x0C   | SAMPLE | 8     | W   | latch the counter into DATA     |
//! | 0x10   | DATA   | 32    | R   | last sampled value              |
//! | 0x14   | SET    | 32    | W   | load the counter                |

use super::regmap::{RegisterDescriptor, RegisterMap};
use crate::hal::regs::Width;

pub const REG_ID: usize = 0x00;
pub const REG_RST: usize = 0x04;
pub const REG_INCR: usize = 0x08;
pub const REG_SAMPLE: usize = 0x0C;
pub const REG_DATA: usize = 0x10;
pub const REG_SET: usize = 0x14;

/// Size of the register window.
pub const WINDOW_SIZE: usize = 0x18;

static REGISTERS: [RegisterDescriptor; 6] = [
    RegisterDescriptor::read_only("ID", REG_ID, Width::W32),
    RegisterDescriptor::pulse("RST", REG_RST, Width::W8),
    RegisterDescriptor::write_only("INCR", REG_INCR, Width::W8),
    RegisterDescriptor::write_only("SAMPLE", REG_SAMPLE, Width::W8),
    RegisterDescriptor::read_only("DATA", REG_DATA, Width::W32),
    RegisterDescriptor::write_only("SET", REG_SET, Width::W32),
];

pub static MAP: RegisterMap = RegisterMap::new(&REGISTERS);
