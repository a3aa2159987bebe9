use super::{IoAccess, IoOp, Trace};
use crate::hal::regs::Width;
use crate::hw::test_counter::{REG_DATA, REG_ID, REG_INCR, REG_RST, REG_SAMPLE, REG_SET};
use alloc::vec::Vec;
use common::sync::SpinLock;
use kernel::io::RegisterIo;

/// Value of the `ID` register.
pub const SIM_COUNTER_ID: u32 = 0xC0C0_0001;

#[derive(Default)]
struct State {
    counter: u32,
    sampled: u32,
    in_reset: bool,
}

/// Counter peripheral.
///
/// A nonzero write to `INCR` counts up and one to `SAMPLE` latches the
/// count into `DATA`. `RST` holds the counter at zero while asserted;
/// `SET` loads it.
#[derive(Default)]
pub struct SimCounter {
    state: SpinLock<State>,
    trace: Trace,
}

impl SimCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live (unsampled) count.
    pub fn counter(&self) -> u32 {
        self.state.lock().counter
    }

    pub fn accesses(&self) -> Vec<IoAccess> {
        self.trace.snapshot()
    }

    pub fn clear_accesses(&self) {
        self.trace.clear();
    }

    fn read(&self, offset: usize, width: Width) -> u32 {
        let state = self.state.lock();
        let value = match offset {
            REG_ID => SIM_COUNTER_ID,
            REG_DATA => state.sampled,
            _ => 0,
        };
        let value = value & width.max_value();
        self.trace.record(IoOp::Read, offset, width, value);
        value
    }

    fn write(&self, offset: usize, width: Width, value: u32) {
        self.trace.record(IoOp::Write, offset, width, value);
        let mut state = self.state.lock();
        match offset {
            REG_RST => {
                state.in_reset = value != 0;
                if state.in_reset {
                    state.counter = 0;
                }
            }
            REG_INCR if value != 0 && !state.in_reset => {
                state.counter = state.counter.wrapping_add(1);
            }
            REG_SAMPLE if value != 0 => state.sampled = state.counter,
            REG_SET if !state.in_reset => state.counter = value,
            _ => {}
        }
    }
}

impl RegisterIo for SimCounter {
    fn read8(&self, offset: usize) -> u8 {
        self.read(offset, Width::W8) as u8
    }

    fn read16(&self, offset: usize) -> u16 {
        self.read(offset, Width::W16) as u16
    }

    fn read32(&self, offset: usize) -> u32 {
        self.read(offset, Width::W32)
    }

    fn write8(&self, offset: usize, value: u8) {
        self.write(offset, Width::W8, value as u32);
    }

    fn write16(&self, offset: usize, value: u16) {
        self.write(offset, Width::W16, value as u32);
    }

    fn write32(&self, offset: usize, value: u32) {
        self.write(offset, Width::W32, value);
    }
}
