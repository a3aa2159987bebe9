use super::{IoAccess, IoOp, Trace};
use crate::hal::regs::Width;
use crate::hw::iob_timer::{
    REG_DATA_HIGH, REG_DATA_LOW, REG_ENABLE, REG_RESET, REG_SAMPLE, REG_VERSION,
};
use alloc::vec::Vec;
use common::sync::SpinLock;
use kernel::io::RegisterIo;

/// Value of the `VERSION` register.
pub const SIM_TIMER_VERSION: u16 = 0x0001;

#[derive(Default)]
struct State {
    counter: u64,
    sampled: u64,
    enabled: bool,
    in_reset: bool,
}

/// IOb timer.
///
/// The clock is driven by [`advance`](SimTimer::advance); ticks only count
/// while the timer is enabled and out of reset.
#[derive(Default)]
pub struct SimTimer {
    state: SpinLock<State>,
    trace: Trace,
}

impl SimTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ticks: u64) {
        let mut state = self.state.lock();
        if state.enabled && !state.in_reset {
            state.counter = state.counter.wrapping_add(ticks);
        }
    }

    pub fn counter(&self) -> u64 {
        self.state.lock().counter
    }

    pub fn accesses(&self) -> Vec<IoAccess> {
        self.trace.snapshot()
    }

    fn read(&self, offset: usize, width: Width) -> u32 {
        let state = self.state.lock();
        let value = match offset {
            REG_DATA_LOW => state.sampled as u32,
            REG_DATA_HIGH => (state.sampled >> 32) as u32,
            REG_VERSION => SIM_TIMER_VERSION as u32,
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
            REG_RESET => {
                state.in_reset = value != 0;
                if state.in_reset {
                    state.counter = 0;
                }
            }
            REG_ENABLE => state.enabled = value != 0,
            REG_SAMPLE if value != 0 => state.sampled = state.counter,
            _ => {}
        }
    }
}

impl RegisterIo for SimTimer {
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
