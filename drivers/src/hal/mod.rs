//! Hardware Abstraction Layer
//!
//! - [`regs`]: width-dispatched register reads and writes

pub mod regs;
