//! Simulated register blocks.
//!
//! Each block implements [`RegisterIo`](kernel::io::RegisterIo) with the
//! behaviour of the real peripheral and records every access, so the
//! driver core can be exercised on a host through [`SimMapper`].

mod counter;
mod mapper;
mod timer;

pub use counter::{SIM_COUNTER_ID, SimCounter};
pub use mapper::SimMapper;
pub use timer::{SIM_TIMER_VERSION, SimTimer};

use crate::hal::regs::Width;
use alloc::vec::Vec;
use common::sync::SpinLock;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IoOp {
    Read,
    Write,
}

/// One bus access seen by a simulated block.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IoAccess {
    pub op: IoOp,
    pub offset: usize,
    pub width: Width,
    pub value: u32,
}

#[derive(Default)]
pub(crate) struct Trace(SpinLock<Vec<IoAccess>>);

impl Trace {
    pub(crate) fn record(&self, op: IoOp, offset: usize, width: Width, value: u32) {
        self.0.lock().push(IoAccess {
            op,
            offset,
            width,
            value,
        });
    }

    pub(crate) fn snapshot(&self) -> Vec<IoAccess> {
        self.0.lock().clone()
    }

    pub(crate) fn clear(&self) {
        self.0.lock().clear();
    }
}
